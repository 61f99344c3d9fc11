//! Server group chat rooms for Parley
//!
//! A conference server hosts chat rooms created by INVITEs addressed to its
//! conference factory. This crate provides:
//! - Room lifecycle (creation, joining, deletion) and admin succession
//! - Participant bookkeeping, including removed participants awaiting BYE
//! - Message fan-out to every participant except the sender
//! - Event notification to registered listeners
//! - A sequential event loop driving every room from one task
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


pub mod error;
pub mod content;
pub mod signaling;
pub mod participant;
pub mod notifier;
pub mod capability;
pub mod room;
pub mod registry;
pub mod service;

// Re-export main types
pub use error::{ChatRoomError, ChatRoomResult};
pub use content::{format_resource_lists, parse_resource_lists, Content, ContentType};
pub use signaling::{
    IncomingMessage, IncomingSession, OutgoingMessage, SessionId, SessionState, SignalingChannel,
    TracingSignalingChannel,
};
pub use participant::{Participant, ParticipantRegistry};
pub use notifier::{ChatRoomListener, EventNotifier, ListenerId};
pub use capability::{Capabilities, ChatRoomCapability, ConferenceCapability};
pub use room::{ChatRoomContext, ServerGroupChatRoom};
pub use registry::ChatRoomRegistry;
pub use service::{ChatRoomService, SignalingEvent, DEFAULT_CHANNEL_CAPACITY};
