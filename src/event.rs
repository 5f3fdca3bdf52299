// src/event.rs

use crate::effects::EffectKind;
use crate::mapper::SlotRole;
use crate::sequencer::ActiveVoiceSet;
use crate::voice::SlotId;

/// ===============================
/// Gesture-side control events
/// ===============================

/// Something the gesture pipeline changed this frame.
///
/// These events:
/// - are produced ONLY by the gesture controller
/// - are delivered synchronously, before the frame call returns
/// - describe changes, never steady state
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    HandAppeared { slot: SlotId, role: SlotRole },

    HandLost { slot: SlotId, role: SlotRole },

    VoiceStarted { slot: SlotId, root: u8 },

    VoiceRetargeted { slot: SlotId, root: u8 },

    VoiceStopped { slot: SlotId },

    PresetChanged { index: usize, name: String },

    DrumsChanged { active: ActiveVoiceSet },

    EffectToggled { effect: EffectKind, active: bool },

    CrossfaderMoved { position: f32 },
}

/// ===============================
/// Observer registry
/// ===============================

pub type ObserverId = u32;

type Observer = Box<dyn FnMut(&ControlEvent)>;

/// Synchronous observer list, delivered in registration order.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<(ObserverId, Observer)>,
    next_id: ObserverId,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&ControlEvent) + 'static) -> ObserverId {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn publish(&mut self, event: &ControlEvent) {
        for (_, observer) in &mut self.observers {
            observer(event);
        }
    }

    /// Deliver a frame's events in order. Each observer sees them in the
    /// order they were produced.
    pub fn publish_all(&mut self, events: &[ControlEvent]) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        for name in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            bus.subscribe(move |_| log.borrow_mut().push(name));
        }

        bus.publish(&ControlEvent::VoiceStopped { slot: 0 });
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();

        let c = Rc::clone(&count);
        let id = bus.subscribe(move |_| *c.borrow_mut() += 1);

        bus.publish(&ControlEvent::CrossfaderMoved { position: 0.2 });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&ControlEvent::CrossfaderMoved { position: 0.3 });

        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_publish_all_keeps_event_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let s = Rc::clone(&seen);
        bus.subscribe(move |e| s.borrow_mut().push(e.clone()));

        let events = vec![
            ControlEvent::VoiceStopped { slot: 0 },
            ControlEvent::PresetChanged {
                index: 1,
                name: "Buzzy Sawtooth".into(),
            },
        ];
        bus.publish_all(&events);
        assert_eq!(*seen.borrow(), events);
    }
}
