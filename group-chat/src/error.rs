//! Error types for group chat rooms
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use parley_types::{ChatRoomState, ParleyError};
use thiserror::Error;

/// Result type for chat room operations
pub type ChatRoomResult<T> = Result<T, ChatRoomError>;

/// Chat room errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatRoomError {
    /// Operation not allowed in the current room state
    #[error("Invalid chat room state: {0:?}")]
    InvalidState(ChatRoomState),

    /// Address is not an active participant of the room
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    /// Body could not be read
    #[error("Malformed content: {0}")]
    MalformedContent(String),

    /// Every generated conference address was already taken
    #[error("No free conference address after {0} attempts")]
    AddressGenerationExhausted(u32),

    /// No room at this conference address
    #[error("Chat room not found: {0}")]
    RoomNotFound(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl From<ParleyError> for ChatRoomError {
    fn from(err: ParleyError) -> Self {
        ChatRoomError::InvalidAddress(err.to_string())
    }
}
