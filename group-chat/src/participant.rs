//! Chat room participants
//!
//! The registry keeps the active participants in join order and a side list
//! of removed participants whose session is still winding down.
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


use crate::signaling::SessionId;
use parley_types::SipAddress;

/// A member of a chat room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    address: SipAddress,
    /// Where this participant's device can be reached
    contact_address: SipAddress,
    is_admin: bool,
    session: Option<SessionId>,
}

impl Participant {
    pub fn new(address: SipAddress) -> Self {
        Self {
            contact_address: address.clone(),
            address,
            is_admin: false,
            session: None,
        }
    }

    pub fn address(&self) -> &SipAddress {
        &self.address
    }

    pub fn contact_address(&self) -> &SipAddress {
        &self.contact_address
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub(crate) fn set_address(&mut self, address: SipAddress) {
        self.address = address;
    }

    pub(crate) fn set_contact_address(&mut self, contact: SipAddress) {
        self.contact_address = contact;
    }

    pub(crate) fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
    }

    pub(crate) fn set_session(&mut self, session: SessionId) {
        self.session = Some(session);
    }
}

/// Active and removed participants of one room.
///
/// Lookups by address use weak equality, so parameters such as `gr` on a
/// contact do not prevent a match.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    participants: Vec<Participant>,
    removed: Vec<Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active participants in join order
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Removed participants awaiting session termination
    pub fn removed(&self) -> &[Participant] {
        &self.removed
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn find(&self, address: &SipAddress) -> Option<&Participant> {
        self.participants.iter().find(|p| p.address.weak_equal(address))
    }

    pub(crate) fn find_mut(&mut self, address: &SipAddress) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.address.weak_equal(address))
    }

    pub fn find_by_session(&self, session: SessionId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.session == Some(session))
    }

    pub fn find_removed_by_session(&self, session: SessionId) -> Option<&Participant> {
        self.removed.iter().find(|p| p.session == Some(session))
    }

    /// Append a participant; `false` if the address is already active
    pub fn add(&mut self, participant: Participant) -> bool {
        if self.find(&participant.address).is_some() {
            return false;
        }
        self.participants.push(participant);
        true
    }

    /// Take an active participant out of the room.
    ///
    /// A participant with a session stays on the removed list until that
    /// session ends; one that never joined is dropped right away.
    pub fn move_to_removed(&mut self, address: &SipAddress) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| p.address.weak_equal(address))?;
        let participant = self.participants.remove(index);
        if participant.session.is_some() {
            self.removed.push(participant.clone());
        }
        Some(participant)
    }

    /// Forget a removed participant once its session is over
    pub fn discard_removed(&mut self, session: SessionId) -> Option<Participant> {
        let index = self.removed.iter().position(|p| p.session == Some(session))?;
        Some(self.removed.remove(index))
    }

    pub fn has_admin(&self) -> bool {
        self.participants.iter().any(|p| p.is_admin)
    }

    pub fn admins(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_admin)
    }

    /// Oldest active participant
    pub fn front(&self) -> Option<&Participant> {
        self.participants.first()
    }
}
