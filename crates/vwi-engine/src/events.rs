//! Observer list for engine notifications.

use crate::interactor::InteractorId;

/// Notifications broadcast by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    /// An interactor started dragging transformables
    StartDragging {
        /// Dragging interactor
        interactor: InteractorId,
    },
    /// An interactor released its drag
    StopDragging {
        /// Releasing interactor
        interactor: InteractorId,
    },
    /// Transformables came to rest after dragging, inertia and smoothing
    FinishedMovingTransformables,
    /// A new world-to-meters scale was requested
    WorldScaleChanged {
        /// Requested scale
        world_to_meters: f32,
    },
    /// An undo transaction was opened
    TransactionBegan {
        /// Human readable description
        description: String,
    },
    /// The undo transaction was closed
    TransactionEnded,
}

/// Token returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&InteractionEvent)>;

/// Subscribers are called in subscription order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("listeners", &self.listeners.len()).finish()
    }
}

impl EventBus {
    /// Create a bus without listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&InteractionEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Sends `event` to every listener.
    pub fn broadcast(&mut self, event: InteractionEvent) {
        tracing::trace!(?event, "broadcast");
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let sink = received.clone();
        let id = bus.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        bus.broadcast(InteractionEvent::FinishedMovingTransformables);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.broadcast(InteractionEvent::TransactionEnded);

        assert_eq!(*received.borrow(), vec![InteractionEvent::FinishedMovingTransformables]);
    }
}
