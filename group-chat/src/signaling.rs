//! Signaling boundary
//!
//! The chat room never talks SIP itself. Incoming requests arrive as
//! [`IncomingSession`] and [`IncomingMessage`] values, and everything the
//! room sends goes through a [`SignalingChannel`]. Sends are fire-and-forget:
//! responses come back later as new events.
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


use crate::content::Content;
use parley_types::{Reason, SipAddress};
use std::fmt;
use tracing::info;
use uuid::Uuid;

/// Identifier of a signaling session (dialog) owned by the SIP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An INVITE (creation, join or re-INVITE) as seen by the room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingSession {
    pub session: SessionId,
    pub from: SipAddress,
    pub to: SipAddress,
    pub remote_contact: SipAddress,
    pub subject: Option<String>,
    pub body: Option<Content>,
}

impl IncomingSession {
    pub fn new(session: SessionId, from: SipAddress, to: SipAddress, remote_contact: SipAddress) -> Self {
        Self {
            session,
            from,
            to,
            remote_contact,
            subject: None,
            body: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_body(mut self, body: Content) -> Self {
        self.body = Some(body);
        self
    }
}

/// A MESSAGE addressed to a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub from: SipAddress,
    pub to: SipAddress,
    pub content: Content,
}

/// A message copy sent by the room to one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from: SipAddress,
    pub to: SipAddress,
    pub content: Content,
    /// Whether content modifiers (CPIM wrapping, encryption) run again
    pub apply_modifiers: bool,
}

/// Session state transitions reported by the SIP layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    /// The peer sent a re-INVITE carrying new parameters
    UpdatedByRemote(IncomingSession),
    End,
}

/// Outgoing signaling primitives
pub trait SignalingChannel: Send + Sync {
    /// Answer the session with 200 OK, advertising `contact`
    fn accept(&self, session: SessionId, contact: &SipAddress);

    fn decline(&self, session: SessionId, reason: Reason);

    /// Answer with a redirection to `target`
    fn redirect(&self, session: SessionId, target: &SipAddress);

    /// Out-of-dialog REFER to `target` carrying `Refer-To: refer_to`
    fn send_refer(&self, target: &SipAddress, refer_to: &SipAddress);

    fn send_message(&self, message: OutgoingMessage);
}

/// Channel that only logs what would be sent
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSignalingChannel;

impl SignalingChannel for TracingSignalingChannel {
    fn accept(&self, session: SessionId, contact: &SipAddress) {
        info!(session = %session, contact = %contact, "Accepting session");
    }

    fn decline(&self, session: SessionId, reason: Reason) {
        info!(session = %session, reason = %reason, status = ?reason.sip_status(), "Declining session");
    }

    fn redirect(&self, session: SessionId, target: &SipAddress) {
        info!(session = %session, target = %target, "Redirecting session");
    }

    fn send_refer(&self, target: &SipAddress, refer_to: &SipAddress) {
        info!(target = %target, refer_to = %refer_to, "Sending REFER");
    }

    fn send_message(&self, message: OutgoingMessage) {
        info!(
            from = %message.from,
            to = %message.to,
            content_type = %message.content.content_type,
            "Sending message"
        );
    }
}
