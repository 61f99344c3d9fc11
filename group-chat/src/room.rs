//! Server-hosted group chat room
//!
//! The room acts as the conference focus: it hands out its conference
//! address, tracks who is in, keeps exactly one admin among the active
//! participants and relays each message to everyone but its sender.
//! Participant changes are applied as soon as the REFER is sent, without
//! waiting for the peer to act on it.
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


use crate::capability::{Capabilities, ChatRoomCapability, ConferenceCapability};
use crate::content::{parse_resource_lists, Content, ContentType};
use crate::error::{ChatRoomError, ChatRoomResult};
use crate::notifier::EventNotifier;
use crate::participant::{Participant, ParticipantRegistry};
use crate::signaling::{IncomingMessage, IncomingSession, OutgoingMessage, SessionId, SessionState, SignalingChannel};
use parley_config::ChatConfig;
use parley_types::{ChatRoomEvent, ChatRoomState, Event, Reason, SipAddress};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Length of the random part of a conference address
const ADDRESS_TOKEN_LEN: usize = 10;

const ADDRESS_PREFIX: &str = "chatroom-";

/// Collaborators shared by every room of a server
#[derive(Clone)]
pub struct ChatRoomContext {
    pub signaling: Arc<dyn SignalingChannel>,
    pub notifier: Arc<EventNotifier>,
    pub config: ChatConfig,
}

impl ChatRoomContext {
    pub fn new(signaling: Arc<dyn SignalingChannel>, config: ChatConfig) -> Self {
        Self {
            signaling,
            notifier: Arc::new(EventNotifier::new()),
            config,
        }
    }
}

/// A group chat room hosted by this server
pub struct ServerGroupChatRoom {
    id: Uuid,
    ctx: ChatRoomContext,
    state: ChatRoomState,
    subject: String,
    /// The focus, reached through the creator's session until creation completes
    me: Participant,
    conference_address: Option<SipAddress>,
    participants: ParticipantRegistry,
    capabilities: Capabilities,
    sequence: u64,
}

impl ServerGroupChatRoom {
    /// Instantiate a room from the creator's INVITE to the conference factory
    pub fn new(ctx: ChatRoomContext, op: &IncomingSession) -> Self {
        let mut me = Participant::new(op.to.clone());
        me.set_session(op.session);

        let id = Uuid::new_v4();
        info!(room_id = %id, creator = %op.from, session = %op.session, "Chat room instantiated");

        Self {
            id,
            ctx,
            state: ChatRoomState::Instantiated,
            subject: op.subject.clone().unwrap_or_default(),
            me,
            conference_address: None,
            participants: ParticipantRegistry::new(),
            capabilities: Capabilities::CONFERENCE,
            sequence: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ChatRoomState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == ChatRoomState::Terminated
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// The focus participant
    pub fn me(&self) -> &Participant {
        &self.me
    }

    pub fn conference_address(&self) -> Option<&SipAddress> {
        self.conference_address.as_ref()
    }

    pub fn participants(&self) -> &[Participant] {
        self.participants.participants()
    }

    pub fn removed_participants(&self) -> &[Participant] {
        self.participants.removed()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn find_participant(&self, address: &SipAddress) -> Option<&Participant> {
        self.participants.find(address)
    }

    pub fn admin(&self) -> Option<&Participant> {
        self.participants.admins().next()
    }

    /// Whether any signaling session of this room is `session`
    pub fn owns_session(&self, session: SessionId) -> bool {
        self.me.session() == Some(session)
            || self.participants.find_by_session(session).is_some()
            || self.participants.find_removed_by_session(session).is_some()
    }

    /// Assign the conference address and redirect the creator to it.
    ///
    /// `is_taken` reports addresses already used by another room; a taken
    /// address is regenerated up to `address_max_attempts` times.
    pub fn confirm_creation(&mut self, is_taken: impl Fn(&SipAddress) -> bool) -> ChatRoomResult<SipAddress> {
        if self.state != ChatRoomState::Instantiated {
            return Err(ChatRoomError::InvalidState(self.state));
        }
        self.set_state(ChatRoomState::CreationPending);

        let address = match self.generate_conference_address(is_taken) {
            Ok(address) => address,
            Err(e) => {
                warn!(room_id = %self.id, error = %e, "Chat room creation failed");
                self.set_state(ChatRoomState::Terminated);
                return Err(e);
            }
        };

        self.me.set_address(address.clone());
        self.me.set_contact_address(address.clone());
        self.conference_address = Some(address.clone());

        if let Some(session) = self.me.session() {
            self.ctx.signaling.redirect(session, &focus_contact(&address));
        }
        self.set_state(ChatRoomState::Created);
        info!(room_id = %self.id, room = %address, "Chat room created");
        Ok(address)
    }

    fn generate_conference_address(&self, is_taken: impl Fn(&SipAddress) -> bool) -> ChatRoomResult<SipAddress> {
        let max_attempts = self.ctx.config.address_max_attempts;
        for attempt in 1..=max_attempts {
            let token: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(ADDRESS_TOKEN_LEN)
                .map(char::from)
                .collect();
            let mut candidate = self.me.contact_address().identity();
            candidate.set_username(Some(&format!("{}{}", ADDRESS_PREFIX, token)));

            if !is_taken(&candidate) {
                return Ok(candidate);
            }
            debug!(attempt, candidate = %candidate, "Conference address already in use");
        }
        Err(ChatRoomError::AddressGenerationExhausted(max_attempts))
    }

    /// Handle an INVITE to the conference address.
    ///
    /// The first joiner becomes admin; anyone else must have been added
    /// before, otherwise the session is declined.
    pub fn confirm_joining(&mut self, op: &IncomingSession) -> ChatRoomResult<()> {
        let conference = match (&self.conference_address, self.state) {
            (Some(address), ChatRoomState::Created) => address.clone(),
            _ => {
                self.ctx.signaling.decline(op.session, Reason::NotAcceptable);
                return Err(ChatRoomError::InvalidState(self.state));
            }
        };

        if self.participants.is_empty() {
            let mut creator = Participant::new(op.from.clone());
            creator.set_admin(true);
            self.participants.add(creator);
            info!(room = %conference, participant = %op.from, "First participant joined as admin");
            self.notify(ChatRoomEvent::ParticipantAdded {
                participant: op.from.clone(),
            });
        }

        let Some(participant) = self.participants.find_mut(&op.from) else {
            warn!(room = %conference, participant = %op.from, "Join from unknown participant");
            self.ctx.signaling.decline(op.session, Reason::Declined);
            return Err(ChatRoomError::UnknownParticipant(op.from.to_string()));
        };

        participant.set_session(op.session);
        participant.set_contact_address(op.remote_contact.clone());
        let is_admin = participant.is_admin();

        self.ctx.signaling.accept(op.session, &focus_contact(&conference));
        debug!(room = %conference, participant = %op.from, admin = is_admin, "Participant session accepted");

        // Changes are only allowed from admins
        if is_admin {
            self.update(op);
        }
        Ok(())
    }

    /// Apply the subject and recipient list carried by an admin's request
    pub fn update(&mut self, op: &IncomingSession) {
        if let Some(subject) = &op.subject {
            self.set_subject(subject);
        }

        let Some(body) = op.body.as_ref().filter(|body| body.is_recipient_list()) else {
            return;
        };
        match parse_resource_lists(&body.body) {
            Ok(addresses) => {
                if let Err(e) = self.add_participants(&addresses) {
                    warn!(room_id = %self.id, error = %e, "Could not add listed participants");
                }
            }
            Err(e) => warn!(room_id = %self.id, error = %e, "Ignoring malformed recipient list"),
        }
    }

    /// Invite `address` with a REFER and add it right away
    pub fn add_participant(&mut self, address: &SipAddress) -> ChatRoomResult<()> {
        let conference = self.created_address()?;
        // Until the creator joins there is no admin to add anyone
        if self.participants.is_empty() {
            warn!(room = %conference, participant = %address, "Add before the first join rejected");
            return Err(ChatRoomError::InvalidState(self.state));
        }
        if self.participants.find(address).is_some() {
            debug!(room = %conference, participant = %address, "Already a participant");
            return Ok(());
        }

        let mut refer_to = conference.clone();
        refer_to.set_param("text", None);
        self.ctx.signaling.send_refer(address, &refer_to);

        self.participants.add(Participant::new(address.clone()));
        info!(room = %conference, participant = %address, "Participant added");
        self.notify(ChatRoomEvent::ParticipantAdded {
            participant: address.clone(),
        });
        Ok(())
    }

    pub fn add_participants(&mut self, addresses: &[SipAddress]) -> ChatRoomResult<()> {
        for address in addresses {
            self.add_participant(address)?;
        }
        Ok(())
    }

    /// Ask the participant to leave with a REFER carrying `method=BYE`, and
    /// remove it right away
    pub fn remove_participant(&mut self, address: &SipAddress) -> ChatRoomResult<()> {
        let conference = self.created_address()?;
        let contact = self
            .participants
            .find(address)
            .map(|p| p.contact_address().clone())
            .ok_or_else(|| ChatRoomError::UnknownParticipant(address.to_string()))?;

        let mut refer_to = conference;
        refer_to.set_param("text", None);
        refer_to.set_uri_param("method", Some("BYE"));
        self.ctx.signaling.send_refer(&contact, &refer_to);

        self.remove_locally(address);
        Ok(())
    }

    /// Move the admin flag to another active participant
    pub fn transfer_admin(&mut self, to: &SipAddress) -> ChatRoomResult<()> {
        if self.participants.find(to).is_none() {
            return Err(ChatRoomError::UnknownParticipant(to.to_string()));
        }

        let previous: Vec<SipAddress> = self
            .participants
            .admins()
            .filter(|p| !p.address().weak_equal(to))
            .map(|p| p.address().clone())
            .collect();

        self.set_participant_admin_status(to, true);
        for address in &previous {
            self.set_participant_admin_status(address, false);
        }
        Ok(())
    }

    pub fn set_subject(&mut self, subject: &str) {
        if self.subject == subject {
            return;
        }
        self.subject = subject.to_string();
        info!(room_id = %self.id, subject, "Subject changed");
        self.notify(ChatRoomEvent::SubjectChanged {
            subject: subject.to_string(),
        });
    }

    /// Send a copy of `content` to every participant but the sender.
    ///
    /// Copies come from the conference address and are not re-wrapped.
    /// Returns the number of copies sent.
    pub fn dispatch_message(&mut self, from: &SipAddress, content: &Content) -> usize {
        let Some(conference) = self.conference_address.clone() else {
            warn!(room_id = %self.id, "Cannot dispatch before creation");
            return 0;
        };

        let recipients: Vec<(SipAddress, SipAddress)> = self
            .participants
            .participants()
            .iter()
            .filter(|p| !from.weak_equal(p.address()))
            .map(|p| (p.address().clone(), p.contact_address().clone()))
            .collect();

        for (address, contact) in &recipients {
            self.ctx.signaling.send_message(OutgoingMessage {
                from: conference.clone(),
                to: contact.clone(),
                content: content.clone(),
                apply_modifiers: false,
            });
            debug!(room = %conference, recipient = %address, "Message dispatched");
            self.notify(ChatRoomEvent::MessageDispatched {
                recipient: address.clone(),
            });
        }
        recipients.len()
    }

    /// Relay a CPIM message from a participant
    pub fn message_received(&mut self, message: &IncomingMessage) -> Reason {
        if self.participants.find(&message.from).is_none() {
            warn!(room_id = %self.id, from = %message.from, "Message from non participant rejected");
            return Reason::NotAcceptable;
        }
        if message.content.content_type != ContentType::CPIM {
            warn!(
                room_id = %self.id,
                from = %message.from,
                content_type = %message.content.content_type,
                "Message is not CPIM, rejected"
            );
            return Reason::NotAcceptable;
        }

        self.dispatch_message(&message.from, &message.content);
        Reason::None
    }

    pub fn on_session_state_changed(&mut self, session: SessionId, state: &SessionState) {
        match state {
            SessionState::End => {
                if let Some(address) = self
                    .participants
                    .find_by_session(session)
                    .map(|p| p.address().clone())
                {
                    info!(room_id = %self.id, participant = %address, "Participant session ended");
                    self.remove_locally(&address);
                }
                if let Some(removed) = self.participants.discard_removed(session) {
                    debug!(room_id = %self.id, participant = %removed.address(), "Removed participant discarded");
                }
            }
            SessionState::UpdatedByRemote(op) => {
                let from_admin = self
                    .participants
                    .find_by_session(session)
                    .is_some_and(Participant::is_admin);
                if from_admin {
                    self.update(op);
                }
            }
            SessionState::Connected => {}
        }
    }

    fn created_address(&self) -> ChatRoomResult<SipAddress> {
        match (&self.conference_address, self.state) {
            (Some(address), ChatRoomState::Created) => Ok(address.clone()),
            _ => Err(ChatRoomError::InvalidState(self.state)),
        }
    }

    fn remove_locally(&mut self, address: &SipAddress) {
        // Removed before notifying so the participant is not told about its own removal
        let Some(removed) = self
            .participants
            .move_to_removed(address)
            .map(|p| p.address().clone())
        else {
            return;
        };

        info!(room_id = %self.id, participant = %removed, "Participant removed");
        self.notify(ChatRoomEvent::ParticipantRemoved { participant: removed });

        if self.participants.is_empty() {
            self.delete();
        } else if !self.participants.has_admin() {
            self.designate_admin();
        }
    }

    /// Promote the oldest participant
    fn designate_admin(&mut self) {
        if let Some(front) = self.participants.front().map(|p| p.address().clone()) {
            self.set_participant_admin_status(&front, true);
        }
    }

    fn set_participant_admin_status(&mut self, address: &SipAddress, is_admin: bool) {
        let Some(participant) = self.participants.find_mut(address) else {
            return;
        };
        if participant.is_admin() == is_admin {
            return;
        }
        participant.set_admin(is_admin);
        let participant = participant.address().clone();

        info!(room_id = %self.id, participant = %participant, is_admin, "Admin status changed");
        self.notify(ChatRoomEvent::ParticipantAdminStatusChanged { participant, is_admin });
    }

    fn delete(&mut self) {
        if self.state == ChatRoomState::Terminated {
            return;
        }
        info!(room_id = %self.id, "Last participant left, deleting chat room");
        self.set_state(ChatRoomState::Terminated);
        self.notify(ChatRoomEvent::RoomDeleted);
    }

    fn set_state(&mut self, state: ChatRoomState) {
        if self.state == state {
            return;
        }
        debug!(room_id = %self.id, from = ?self.state, to = ?state, "Chat room state changed");
        self.state = state;
        self.notify(ChatRoomEvent::StateChanged { state });
    }

    fn notify(&mut self, event: ChatRoomEvent) {
        self.sequence += 1;
        let event = Event::new(self.conference_address.clone(), self.sequence, event);
        self.ctx.notifier.notify(&event);
    }
}

/// Contact advertising the focus role
fn focus_contact(conference: &SipAddress) -> SipAddress {
    let mut contact = conference.clone();
    contact.set_param("isfocus", None);
    contact
}

impl ChatRoomCapability for ServerGroupChatRoom {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn state(&self) -> ChatRoomState {
        self.state
    }

    fn peer_address(&self) -> Option<&SipAddress> {
        self.conference_address.as_ref()
    }

    fn message_received(&mut self, message: &IncomingMessage) -> Reason {
        ServerGroupChatRoom::message_received(self, message)
    }
}

impl ConferenceCapability for ServerGroupChatRoom {
    fn conference_address(&self) -> Option<&SipAddress> {
        self.conference_address.as_ref()
    }

    fn subject(&self) -> &str {
        &self.subject
    }

    fn set_subject(&mut self, subject: &str) {
        ServerGroupChatRoom::set_subject(self, subject)
    }

    fn participants(&self) -> &[Participant] {
        self.participants.participants()
    }

    fn find_participant(&self, address: &SipAddress) -> Option<&Participant> {
        self.participants.find(address)
    }

    fn add_participant(&mut self, address: &SipAddress) -> ChatRoomResult<()> {
        ServerGroupChatRoom::add_participant(self, address)
    }

    fn remove_participant(&mut self, address: &SipAddress) -> ChatRoomResult<()> {
        ServerGroupChatRoom::remove_participant(self, address)
    }
}
