//! Chat room roles
//!
//! A server group chat room is both a chat room (it receives and relays
//! messages) and a conference (it owns a participant list). Each role is a
//! trait; the room implements both.
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


use crate::error::ChatRoomResult;
use crate::participant::Participant;
use crate::signaling::IncomingMessage;
use parley_types::{ChatRoomState, Reason, SipAddress};
use std::ops::BitOr;

/// Capability bitmask of a chat room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const BASIC: Capabilities = Capabilities(1 << 0);
    pub const REAL_TIME_TEXT: Capabilities = Capabilities(1 << 1);
    pub const CONFERENCE: Capabilities = Capabilities(1 << 2);
    pub const PROXY: Capabilities = Capabilities(1 << 3);
    pub const MIGRATABLE: Capabilities = Capabilities(1 << 4);
    pub const ONE_TO_ONE: Capabilities = Capabilities(1 << 5);

    pub fn empty() -> Self {
        Capabilities(0)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Self) -> Self {
        Capabilities(self.0 | rhs.0)
    }
}

/// Message relay role
pub trait ChatRoomCapability {
    fn capabilities(&self) -> Capabilities;

    fn state(&self) -> ChatRoomState;

    /// Address peers use to reach the room, once created
    fn peer_address(&self) -> Option<&SipAddress>;

    /// Check and relay an incoming message, returning the reason to answer with
    fn message_received(&mut self, message: &IncomingMessage) -> Reason;
}

/// Participant list role
pub trait ConferenceCapability {
    fn conference_address(&self) -> Option<&SipAddress>;

    fn subject(&self) -> &str;

    fn set_subject(&mut self, subject: &str);

    fn participants(&self) -> &[Participant];

    fn find_participant(&self, address: &SipAddress) -> Option<&Participant>;

    fn add_participant(&mut self, address: &SipAddress) -> ChatRoomResult<()>;

    fn remove_participant(&mut self, address: &SipAddress) -> ChatRoomResult<()>;

    fn participant_count(&self) -> usize {
        self.participants().len()
    }
}
