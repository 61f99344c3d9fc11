//! Chat room event loop
//!
//! All room state lives in one [`ChatRoomRegistry`] owned by a single task.
//! The SIP layer feeds it [`SignalingEvent`]s through an `mpsc` channel and
//! events are processed one at a time in arrival order, so two joins never
//! race.
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
use crate::registry::ChatRoomRegistry;
use crate::signaling::{IncomingMessage, IncomingSession, SessionId, SessionState};
use parley_types::{Reason, SipAddress};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Default capacity of the event channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Input of the chat room loop
#[derive(Debug)]
pub enum SignalingEvent {
    Invite(IncomingSession),
    Message {
        message: IncomingMessage,
        /// Receives the reason to answer the MESSAGE with
        reply: Option<oneshot::Sender<Reason>>,
    },
    SessionStateChanged {
        session: SessionId,
        state: SessionState,
    },
    AddParticipant {
        room: SipAddress,
        participant: SipAddress,
        reply: Option<oneshot::Sender<ChatRoomResult<()>>>,
    },
    RemoveParticipant {
        room: SipAddress,
        participant: SipAddress,
        reply: Option<oneshot::Sender<ChatRoomResult<()>>>,
    },
}

/// Sequential processor of signaling events
pub struct ChatRoomService {
    registry: ChatRoomRegistry,
    events: mpsc::Receiver<SignalingEvent>,
}

impl ChatRoomService {
    /// Create the service and the sender feeding it
    pub fn new(registry: ChatRoomRegistry, capacity: usize) -> (Self, mpsc::Sender<SignalingEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { registry, events: rx }, tx)
    }

    pub fn registry(&self) -> &ChatRoomRegistry {
        &self.registry
    }

    /// Process events until every sender is dropped, then hand back the registry
    pub async fn run(mut self) -> anyhow::Result<ChatRoomRegistry> {
        info!("Waiting for signaling events...");

        while let Some(event) = self.events.recv().await {
            self.process(event);
        }

        warn!(rooms = self.registry.room_count(), "Signaling event channel closed");
        Ok(self.registry)
    }

    /// Process a single event
    pub fn process(&mut self, event: SignalingEvent) {
        match event {
            SignalingEvent::Invite(op) => {
                debug!(session = %op.session, from = %op.from, to = %op.to, "INVITE received");
                if let Err(e) = self.registry.handle_invite(&op) {
                    warn!(session = %op.session, error = %e, "INVITE rejected");
                }
            }
            SignalingEvent::Message { message, reply } => {
                let reason = self.registry.handle_message(&message);
                debug!(from = %message.from, to = %message.to, reason = %reason, "MESSAGE handled");
                send_reply(reply, reason);
            }
            SignalingEvent::SessionStateChanged { session, state } => {
                self.registry.handle_session_state(session, &state);
            }
            SignalingEvent::AddParticipant { room, participant, reply } => {
                let result = self.registry.add_participant(&room, &participant);
                if let Err(e) = &result {
                    warn!(room = %room, participant = %participant, error = %e, "Could not add participant");
                }
                send_reply(reply, result);
            }
            SignalingEvent::RemoveParticipant { room, participant, reply } => {
                let result = self.registry.remove_participant(&room, &participant);
                if let Err(e) = &result {
                    warn!(room = %room, participant = %participant, error = %e, "Could not remove participant");
                }
                send_reply(reply, result);
            }
        }
    }
}

fn send_reply<T>(reply: Option<oneshot::Sender<T>>, value: T) {
    if let Some(reply) = reply {
        if reply.send(value).is_err() {
            debug!("Reply receiver dropped");
        }
    }
}
