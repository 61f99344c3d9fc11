//! Chat rooms hosted by this server
//!
//! Routes incoming INVITEs, MESSAGEs and session state changes to the room
//! they belong to, creates rooms for INVITEs addressed to the conference
//! factory and drops rooms once they are terminated.
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


use crate::error::{ChatRoomError, ChatRoomResult};
use crate::room::{ChatRoomContext, ServerGroupChatRoom};
use crate::signaling::{IncomingMessage, IncomingSession, SessionId, SessionState};
use parley_types::{Reason, SipAddress};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Owner of every room, keyed by room id
pub struct ChatRoomRegistry {
    ctx: ChatRoomContext,
    factory_address: SipAddress,
    rooms: HashMap<Uuid, ServerGroupChatRoom>,
}

impl ChatRoomRegistry {
    pub fn new(ctx: ChatRoomContext) -> ChatRoomResult<Self> {
        let factory_address = SipAddress::parse(&ctx.config.conference_factory_uri)?;
        info!(factory = %factory_address, "Chat room registry ready");
        Ok(Self {
            ctx,
            factory_address,
            rooms: HashMap::new(),
        })
    }

    pub fn context(&self) -> &ChatRoomContext {
        &self.ctx
    }

    pub fn factory_address(&self) -> &SipAddress {
        &self.factory_address
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &ServerGroupChatRoom> {
        self.rooms.values()
    }

    pub fn find_room(&self, address: &SipAddress) -> Option<&ServerGroupChatRoom> {
        self.rooms.values().find(|room| is_room_address(room, address))
    }

    pub fn find_room_mut(&mut self, address: &SipAddress) -> Option<&mut ServerGroupChatRoom> {
        self.rooms.values_mut().find(|room| is_room_address(room, address))
    }

    /// Create a room (INVITE to the factory) or join one (INVITE to a room).
    ///
    /// Returns the conference address of the room involved.
    pub fn handle_invite(&mut self, op: &IncomingSession) -> ChatRoomResult<SipAddress> {
        if op.to.weak_equal(&self.factory_address) {
            return self.create_room(op);
        }

        let Some(room) = self.find_room_mut(&op.to) else {
            warn!(to = %op.to, from = %op.from, "INVITE for unknown chat room");
            self.ctx.signaling.decline(op.session, Reason::NotAcceptable);
            return Err(ChatRoomError::RoomNotFound(op.to.to_string()));
        };
        room.confirm_joining(op)?;
        let address = room.conference_address().cloned();
        address.ok_or(ChatRoomError::RoomNotFound(op.to.to_string()))
    }

    fn create_room(&mut self, op: &IncomingSession) -> ChatRoomResult<SipAddress> {
        let mut room = ServerGroupChatRoom::new(self.ctx.clone(), op);
        let rooms = &self.rooms;
        let result = room.confirm_creation(|candidate| {
            rooms.values().any(|existing| is_room_address(existing, candidate))
        });

        match result {
            Ok(address) => {
                self.rooms.insert(room.id(), room);
                Ok(address)
            }
            Err(e) => {
                self.ctx.signaling.decline(op.session, Reason::NotAcceptable);
                Err(e)
            }
        }
    }

    /// Route a MESSAGE to its room and return the reason to answer with
    pub fn handle_message(&mut self, message: &IncomingMessage) -> Reason {
        match self.find_room_mut(&message.to) {
            Some(room) => room.message_received(message),
            None => {
                warn!(to = %message.to, from = %message.from, "MESSAGE for unknown chat room");
                Reason::NotAcceptable
            }
        }
    }

    pub fn handle_session_state(&mut self, session: SessionId, state: &SessionState) {
        let Some(room) = self.rooms.values_mut().find(|room| room.owns_session(session)) else {
            return;
        };
        room.on_session_state_changed(session, state);
        self.remove_terminated();
    }

    pub fn add_participant(&mut self, room: &SipAddress, participant: &SipAddress) -> ChatRoomResult<()> {
        self.room_mut_or_err(room)?.add_participant(participant)
    }

    pub fn remove_participant(&mut self, room: &SipAddress, participant: &SipAddress) -> ChatRoomResult<()> {
        let result = self.room_mut_or_err(room)?.remove_participant(participant);
        self.remove_terminated();
        result
    }

    fn room_mut_or_err(&mut self, address: &SipAddress) -> ChatRoomResult<&mut ServerGroupChatRoom> {
        self.find_room_mut(address)
            .ok_or_else(|| ChatRoomError::RoomNotFound(address.to_string()))
    }

    /// Drop terminated rooms, returning how many were dropped
    pub fn remove_terminated(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|id, room| {
            if room.is_terminated() {
                info!(room_id = %id, room = ?room.conference_address(), "Chat room deleted");
                false
            } else {
                true
            }
        });
        before - self.rooms.len()
    }
}

fn is_room_address(room: &ServerGroupChatRoom, address: &SipAddress) -> bool {
    room.conference_address()
        .is_some_and(|conference| conference.weak_equal(address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Content, ContentType};
    use crate::signaling::TracingSignalingChannel;
    use parley_config::ChatConfig;
    use std::sync::Arc;

    fn addr(user: &str) -> SipAddress {
        SipAddress::new(Some(user), "example.org")
    }

    fn registry() -> ChatRoomRegistry {
        let config = ChatConfig {
            conference_factory_uri: "sip:conference-factory@example.org".to_string(),
            ..ChatConfig::default()
        };
        ChatRoomRegistry::new(ChatRoomContext::new(Arc::new(TracingSignalingChannel), config)).unwrap()
    }

    fn invite(from: &str, to: SipAddress) -> IncomingSession {
        IncomingSession::new(SessionId::new(), addr(from), to, addr(from))
    }

    #[test]
    fn test_invalid_factory_uri() {
        let config = ChatConfig {
            conference_factory_uri: "conference-factory".to_string(),
            ..ChatConfig::default()
        };
        let result = ChatRoomRegistry::new(ChatRoomContext::new(Arc::new(TracingSignalingChannel), config));
        assert!(matches!(result, Err(ChatRoomError::InvalidAddress(_))));
    }

    #[test]
    fn test_create_join_and_route() {
        let mut registry = registry();
        let factory = registry.factory_address().clone();

        let first = registry.handle_invite(&invite("alice", factory.clone())).unwrap();
        let second = registry.handle_invite(&invite("bob", factory)).unwrap();
        assert_eq!(registry.room_count(), 2);
        assert!(!first.weak_equal(&second));

        let joined = registry.handle_invite(&invite("alice", first.clone())).unwrap();
        assert_eq!(joined, first);
        assert_eq!(registry.find_room(&first).unwrap().participant_count(), 1);

        let message = IncomingMessage {
            from: addr("alice"),
            to: first.clone(),
            content: Content::new(ContentType::CPIM, "hi"),
        };
        assert_eq!(registry.handle_message(&message), Reason::None);

        let lost = IncomingMessage {
            to: addr("chatroom-nothere"),
            ..message
        };
        assert_eq!(registry.handle_message(&lost), Reason::NotAcceptable);
        assert!(matches!(
            registry.handle_invite(&invite("carol", addr("chatroom-nothere"))),
            Err(ChatRoomError::RoomNotFound(_))
        ));
    }

    #[test]
    fn test_terminated_rooms_are_dropped() {
        let mut registry = registry();
        let factory = registry.factory_address().clone();
        let room = registry.handle_invite(&invite("alice", factory)).unwrap();

        let join = invite("alice", room.clone());
        registry.handle_invite(&join).unwrap();
        registry.add_participant(&room, &addr("bob")).unwrap();

        registry.remove_participant(&room, &addr("bob")).unwrap();
        assert_eq!(registry.room_count(), 1);

        registry.handle_session_state(join.session, &SessionState::End);
        assert_eq!(registry.room_count(), 0);
        assert!(matches!(
            registry.add_participant(&room, &addr("bob")),
            Err(ChatRoomError::RoomNotFound(_))
        ));
    }
}
