//! Decision Engine v1: Event Notifications
//!
//! Components queue events in the order their mutations happen. The
//! `EventBus` then delivers them synchronously, in order, to every
//! registered callback before the mutating call returns. Callbacks only
//! see `&GameEvent`, so they cannot re-enter the engine.

use std::fmt;

use serde::Serialize;

use crate::consequence::ConsequenceResult;
use crate::resources::{CrisisLevel, ResourceType};
use crate::state::GamePhase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GameEvent {
    ResourceChanged {
        kind: ResourceType,
        new_value: i32,
        change: i32,
    },
    CrisisTriggered {
        kind: ResourceType,
        level: CrisisLevel,
    },
    GameOver,
    DayChanged {
        day: u32,
    },
    PhaseChanged {
        old: GamePhase,
        new: GamePhase,
    },
    ConsequenceGenerated(Box<ConsequenceResult>),
}

/// Handle returned by `EventBus::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&GameEvent) + Send>;

/// Synchronous, in-order fan-out to registered callbacks.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver one event to every subscriber, in subscription order.
    pub fn publish(&mut self, event: &GameEvent) {
        for (_, callback) in &mut self.subscribers {
            callback(event);
        }
    }

    /// Drain `queue`, delivering each event in order.
    pub fn dispatch(&mut self, queue: &mut Vec<GameEvent>) {
        for event in queue.drain(..) {
            self.publish(&event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn dispatch_delivers_in_order_and_drains() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut bus = EventBus::new();
        bus.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        let mut queue = vec![
            GameEvent::DayChanged { day: 2 },
            GameEvent::GameOver,
        ];
        bus.dispatch(&mut queue);

        assert!(queue.is_empty());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![GameEvent::DayChanged { day: 2 }, GameEvent::GameOver]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Arc::new(Mutex::new(0));
        let c = Arc::clone(&count);
        let mut bus = EventBus::new();
        let id = bus.subscribe(move |_| *c.lock().unwrap() += 1);

        bus.publish(&GameEvent::GameOver);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&GameEvent::GameOver);

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
