//! Integration Tests for Server Group Chat
//!
//! Exercises rooms through the registry and the service loop with a
//! recording signaling channel, checking what goes on the wire and which
//! events listeners receive.

use group_chat::content::RECIPIENT_LIST_DISPOSITION;
use group_chat::{
    format_resource_lists, ChatRoomContext, ChatRoomListener, ChatRoomRegistry, ChatRoomService,
    Content, ContentType, IncomingMessage, IncomingSession, OutgoingMessage, SessionId,
    SessionState, SignalingChannel, SignalingEvent,
};
use parley_config::ChatConfig;
use parley_types::{ChatRoomState, Event, EventType, Reason, SipAddress};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Signaling channel that keeps every call
#[derive(Default)]
struct RecordingChannel {
    refers: Mutex<Vec<(SipAddress, SipAddress)>>,
    messages: Mutex<Vec<OutgoingMessage>>,
    declines: Mutex<Vec<(SessionId, Reason)>>,
    accepts: Mutex<Vec<SessionId>>,
    redirects: Mutex<Vec<SipAddress>>,
}

impl SignalingChannel for RecordingChannel {
    fn accept(&self, session: SessionId, _contact: &SipAddress) {
        self.accepts.lock().unwrap().push(session);
    }

    fn decline(&self, session: SessionId, reason: Reason) {
        self.declines.lock().unwrap().push((session, reason));
    }

    fn redirect(&self, _session: SessionId, target: &SipAddress) {
        self.redirects.lock().unwrap().push(target.clone());
    }

    fn send_refer(&self, target: &SipAddress, refer_to: &SipAddress) {
        self.refers.lock().unwrap().push((target.clone(), refer_to.clone()));
    }

    fn send_message(&self, message: OutgoingMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

/// Listener counting events by type
#[derive(Default)]
struct EventCounter {
    events: Mutex<Vec<Event>>,
}

impl EventCounter {
    fn count(&self, event_type: EventType) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

impl ChatRoomListener for EventCounter {
    fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn addr(user: &str) -> SipAddress {
    SipAddress::new(Some(user), "sip.example.org")
}

struct Fixture {
    channel: Arc<RecordingChannel>,
    events: Arc<EventCounter>,
    registry: ChatRoomRegistry,
}

fn fixture() -> Fixture {
    let channel = Arc::new(RecordingChannel::default());
    let config = ChatConfig {
        conference_factory_uri: "sip:conference-factory@sip.example.org".to_string(),
        ..ChatConfig::default()
    };
    let ctx = ChatRoomContext::new(channel.clone(), config);
    let events = Arc::new(EventCounter::default());
    ctx.notifier.register(events.clone());
    let registry = ChatRoomRegistry::new(ctx).unwrap();
    Fixture {
        channel,
        events,
        registry,
    }
}

fn invite(from: &str, to: SipAddress) -> IncomingSession {
    IncomingSession::new(SessionId::new(), addr(from), to, addr(from))
}

fn recipient_list(users: &[&str]) -> Content {
    let addresses: Vec<SipAddress> = users.iter().map(|user| addr(user)).collect();
    Content::new(ContentType::RESOURCE_LISTS, format_resource_lists(&addresses).unwrap())
        .with_disposition(RECIPIENT_LIST_DISPOSITION)
}

/// Create a room and join as alice with bob and carol on the recipient list
fn populated(f: &mut Fixture) -> (SipAddress, IncomingSession) {
    let factory = f.registry.factory_address().clone();
    let room = f
        .registry
        .handle_invite(&invite("alice", factory).with_subject("Weekend"))
        .unwrap();
    let join = invite("alice", room.clone()).with_body(recipient_list(&["bob", "carol"]));
    f.registry.handle_invite(&join).unwrap();
    (room, join)
}

#[test]
fn test_creation_redirects_to_focus_contact() {
    let mut f = fixture();
    let (room, _) = populated(&mut f);

    let redirects = f.channel.redirects.lock().unwrap().clone();
    assert_eq!(redirects.len(), 1);
    assert!(redirects[0].weak_equal(&room));
    assert!(redirects[0].has_param("isfocus"));
    assert!(room.username().is_some_and(|user| user.starts_with("chatroom-")));

    let chat_room = f.registry.find_room(&room).unwrap();
    assert_eq!(chat_room.state(), ChatRoomState::Created);
    assert_eq!(chat_room.subject(), "Weekend");
}

#[test]
fn test_recipient_list_invites_with_refer() {
    let mut f = fixture();
    let (room, _) = populated(&mut f);

    let refers = f.channel.refers.lock().unwrap().clone();
    assert_eq!(refers.len(), 2);
    assert!(refers[0].0.weak_equal(&addr("bob")));
    assert!(refers[1].0.weak_equal(&addr("carol")));
    for (_, refer_to) in &refers {
        assert!(refer_to.weak_equal(&room));
        assert!(refer_to.has_param("text"));
        assert!(!refer_to.has_uri_param("method"));
    }

    let chat_room = f.registry.find_room(&room).unwrap();
    assert_eq!(chat_room.participant_count(), 3);
    assert!(chat_room.find_participant(&addr("alice")).unwrap().is_admin());
    assert_eq!(f.events.count(EventType::ParticipantAdded), 3);
}

#[test]
fn test_admin_succession_and_single_deletion() {
    let mut f = fixture();
    let (room, _) = populated(&mut f);

    f.registry.remove_participant(&room, &addr("alice")).unwrap();
    let chat_room = f.registry.find_room(&room).unwrap();
    assert!(chat_room.admin().is_some_and(|p| p.address().weak_equal(&addr("bob"))));
    assert_eq!(chat_room.participants().iter().filter(|p| p.is_admin()).count(), 1);

    let (target, refer_to) = f.channel.refers.lock().unwrap().last().cloned().unwrap();
    assert_eq!(target, addr("alice"));
    assert_eq!(refer_to.uri_param("method"), Some(Some("BYE")));

    f.registry.remove_participant(&room, &addr("bob")).unwrap();
    assert_eq!(f.registry.room_count(), 1);
    f.registry.remove_participant(&room, &addr("carol")).unwrap();

    assert_eq!(f.registry.room_count(), 0);
    assert_eq!(f.events.count(EventType::RoomDeleted), 1);
    assert_eq!(f.events.count(EventType::ParticipantRemoved), 3);
}

#[test]
fn test_add_before_creator_joins_is_refused() {
    let mut f = fixture();
    let factory = f.registry.factory_address().clone();
    let room = f.registry.handle_invite(&invite("alice", factory)).unwrap();

    assert!(f.registry.add_participant(&room, &addr("bob")).is_err());
    assert!(f.channel.refers.lock().unwrap().is_empty());

    f.registry.handle_invite(&invite("alice", room.clone())).unwrap();
    let chat_room = f.registry.find_room(&room).unwrap();
    assert_eq!(chat_room.participant_count(), 1);
    assert!(chat_room.find_participant(&addr("alice")).unwrap().is_admin());
}

#[test]
fn test_message_fan_out_skips_sender() {
    let mut f = fixture();
    let (room, _) = populated(&mut f);

    let reason = f.registry.handle_message(&IncomingMessage {
        from: addr("bob"),
        to: room.clone(),
        content: Content::new(ContentType::CPIM, "Hello all"),
    });
    assert_eq!(reason, Reason::None);

    let messages = f.channel.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].to.weak_equal(&addr("alice")));
    assert!(messages[1].to.weak_equal(&addr("carol")));
    assert!(messages.iter().all(|m| m.from == room && !m.apply_modifiers));
}

#[test]
fn test_message_from_non_participant_is_not_sent() {
    let mut f = fixture();
    let (room, _) = populated(&mut f);

    let reason = f.registry.handle_message(&IncomingMessage {
        from: addr("mallory"),
        to: room.clone(),
        content: Content::new(ContentType::CPIM, "spam"),
    });
    assert_eq!(reason, Reason::NotAcceptable);

    let plain = f.registry.handle_message(&IncomingMessage {
        from: addr("bob"),
        to: room,
        content: Content::new(ContentType::PLAIN_TEXT, "not wrapped"),
    });
    assert_eq!(plain, Reason::NotAcceptable);

    assert!(f.channel.messages.lock().unwrap().is_empty());
    assert_eq!(f.events.count(EventType::MessageDispatched), 0);
}

#[test]
fn test_unknown_joiner_is_declined() {
    let mut f = fixture();
    let (room, _) = populated(&mut f);

    let intruder = invite("mallory", room);
    assert!(f.registry.handle_invite(&intruder).is_err());
    assert!(f
        .channel
        .declines
        .lock()
        .unwrap()
        .contains(&(intruder.session, Reason::Declined)));
}

#[test]
fn test_session_end_removes_participant() {
    let mut f = fixture();
    let (room, alice_join) = populated(&mut f);

    let bob_join = invite("bob", room.clone());
    f.registry.handle_invite(&bob_join).unwrap();
    assert_eq!(f.channel.accepts.lock().unwrap().len(), 2);

    f.registry.handle_session_state(alice_join.session, &SessionState::End);
    let chat_room = f.registry.find_room(&room).unwrap();
    assert_eq!(chat_room.participant_count(), 2);
    assert!(chat_room.find_participant(&addr("bob")).unwrap().is_admin());

    // Bob, now admin, renames the room from inside his session
    let update = invite("bob", room.clone()).with_subject("Monday");
    f.registry
        .handle_session_state(bob_join.session, &SessionState::UpdatedByRemote(update));
    assert_eq!(f.registry.find_room(&room).unwrap().subject(), "Monday");
}

#[tokio::test]
async fn test_service_processes_events_sequentially() {
    let f = fixture();
    let factory = f.registry.factory_address().clone();
    let (service, tx) = ChatRoomService::new(f.registry, 16);
    let handle = tokio::spawn(service.run());

    tx.send(SignalingEvent::Invite(invite("alice", factory))).await.unwrap();
    drop(tx);
    let mut registry = handle.await.unwrap().unwrap();
    assert_eq!(registry.room_count(), 1);
    let room = f.channel.redirects.lock().unwrap()[0].identity();

    // Second run over the same registry, continuing where the first stopped
    let (service, tx) = ChatRoomService::new(registry, 16);
    let handle = tokio::spawn(service.run());

    let alice = invite("alice", room.clone());
    tx.send(SignalingEvent::Invite(alice.clone())).await.unwrap();

    let (add_tx, add_rx) = oneshot::channel();
    tx.send(SignalingEvent::AddParticipant {
        room: room.clone(),
        participant: addr("bob"),
        reply: Some(add_tx),
    })
    .await
    .unwrap();
    assert_eq!(add_rx.await.unwrap(), Ok(()));

    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(SignalingEvent::Message {
        message: IncomingMessage {
            from: addr("alice"),
            to: room.clone(),
            content: Content::new(ContentType::CPIM, "hi bob"),
        },
        reply: Some(reply_tx),
    })
    .await
    .unwrap();
    assert_eq!(reply_rx.await.unwrap(), Reason::None);

    tx.send(SignalingEvent::SessionStateChanged {
        session: alice.session,
        state: SessionState::End,
    })
    .await
    .unwrap();
    drop(tx);

    registry = handle.await.unwrap().unwrap();
    let chat_room = registry.find_room(&room).unwrap();
    assert_eq!(chat_room.participant_count(), 1);
    assert!(chat_room.find_participant(&addr("bob")).unwrap().is_admin());
    assert_eq!(f.channel.messages.lock().unwrap().len(), 1);
}
