//! Chat room event fan-out
//!
//! Listeners are registered on an [`EventNotifier`] shared by every room.
//! Each delivery works on a snapshot of the listener set, so a listener may
//! unregister itself (or others) from inside its callback.
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


use parley_types::Event;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Receives chat room events
pub trait ChatRoomListener: Send + Sync {
    fn on_event(&self, event: &Event);
}

/// Handle returned by [`EventNotifier::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listeners = Vec<(ListenerId, Arc<dyn ChatRoomListener>)>;

/// Listener registry and dispatcher
#[derive(Default)]
pub struct EventNotifier {
    listeners: Mutex<Listeners>,
    next_id: AtomicU64,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn ChatRoomListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, listener));
        id
    }

    /// Returns `false` if the listener was not registered
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    /// Deliver an event to every listener registered when delivery starts
    pub fn notify(&self, event: &Event) {
        let snapshot: Vec<Arc<dyn ChatRoomListener>> =
            self.lock().iter().map(|(_, listener)| Arc::clone(listener)).collect();

        debug!(
            event_type = ?event.event_type(),
            sequence = event.sequence,
            listeners = snapshot.len(),
            "Notifying chat room event"
        );

        for listener in snapshot {
            listener.on_event(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::{ChatRoomEvent, EventType};
    use std::sync::OnceLock;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<EventType>>,
    }

    impl ChatRoomListener for Recorder {
        fn on_event(&self, event: &Event) {
            self.events.lock().unwrap().push(event.event_type());
        }
    }

    /// Unregisters itself on the first event
    struct OneShot {
        notifier: Arc<EventNotifier>,
        id: OnceLock<ListenerId>,
        calls: AtomicU64,
    }

    impl ChatRoomListener for OneShot {
        fn on_event(&self, _event: &Event) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = self.id.get() {
                self.notifier.unregister(*id);
            }
        }
    }

    fn subject_event(sequence: u64) -> Event {
        Event::new(
            None,
            sequence,
            ChatRoomEvent::SubjectChanged {
                subject: "hello".to_string(),
            },
        )
    }

    #[test]
    fn test_register_and_notify() {
        let notifier = EventNotifier::new();
        let recorder = Arc::new(Recorder::default());
        let id = notifier.register(recorder.clone());

        notifier.notify(&subject_event(1));
        notifier.notify(&Event::new(None, 2, ChatRoomEvent::RoomDeleted));
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec![EventType::SubjectChanged, EventType::RoomDeleted]
        );

        assert!(notifier.unregister(id));
        assert!(!notifier.unregister(id));
        notifier.notify(&subject_event(3));
        assert_eq!(recorder.events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_listener_unregisters_during_delivery() {
        let notifier = Arc::new(EventNotifier::new());
        let one_shot = Arc::new(OneShot {
            notifier: notifier.clone(),
            id: OnceLock::new(),
            calls: AtomicU64::new(0),
        });
        let id = notifier.register(one_shot.clone());
        let _ = one_shot.id.set(id);
        let recorder = Arc::new(Recorder::default());
        notifier.register(recorder.clone());

        notifier.notify(&subject_event(1));
        notifier.notify(&subject_event(2));

        assert_eq!(one_shot.calls.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.events.lock().unwrap().len(), 2);
        assert_eq!(notifier.listener_count(), 1);
    }
}
