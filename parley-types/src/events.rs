//! Chat room notification events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::SipAddress;
use crate::error::Result;

/// Chat room lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRoomState {
    /// Room object exists, nothing negotiated yet
    Instantiated,
    /// Conference address being generated
    CreationPending,
    /// Room reachable at its conference address
    Created,
    /// Room deleted (last participant left)
    Terminated,
}

/// Event type identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "chat_room.participant_added")]
    ParticipantAdded,
    #[serde(rename = "chat_room.participant_removed")]
    ParticipantRemoved,
    #[serde(rename = "chat_room.admin_status_changed")]
    ParticipantAdminStatusChanged,
    #[serde(rename = "chat_room.subject_changed")]
    SubjectChanged,
    #[serde(rename = "chat_room.state_changed")]
    StateChanged,
    #[serde(rename = "chat_room.message_dispatched")]
    MessageDispatched,
    #[serde(rename = "chat_room.deleted")]
    RoomDeleted,
}

/// What happened, with the affected entity and its new value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatRoomEvent {
    ParticipantAdded {
        participant: SipAddress,
    },
    ParticipantRemoved {
        participant: SipAddress,
    },
    ParticipantAdminStatusChanged {
        participant: SipAddress,
        is_admin: bool,
    },
    SubjectChanged {
        subject: String,
    },
    StateChanged {
        state: ChatRoomState,
    },
    MessageDispatched {
        recipient: SipAddress,
    },
    RoomDeleted,
}

impl ChatRoomEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            ChatRoomEvent::ParticipantAdded { .. } => EventType::ParticipantAdded,
            ChatRoomEvent::ParticipantRemoved { .. } => EventType::ParticipantRemoved,
            ChatRoomEvent::ParticipantAdminStatusChanged { .. } => {
                EventType::ParticipantAdminStatusChanged
            }
            ChatRoomEvent::SubjectChanged { .. } => EventType::SubjectChanged,
            ChatRoomEvent::StateChanged { .. } => EventType::StateChanged,
            ChatRoomEvent::MessageDispatched { .. } => EventType::MessageDispatched,
            ChatRoomEvent::RoomDeleted => EventType::RoomDeleted,
        }
    }
}

/// Envelope delivered to listeners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier
    pub event_id: Uuid,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Conference address of the room that produced the event, once assigned
    pub room: Option<SipAddress>,

    /// Per-room sequence number, increasing in mutation order
    pub sequence: u64,

    /// Event body
    pub event: ChatRoomEvent,
}

impl Event {
    /// Create a new event
    pub fn new(room: Option<SipAddress>, sequence: u64, event: ChatRoomEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            room,
            sequence,
            event,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event.event_type()
    }

    /// Serialize to JSON for external listeners
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
