//! Publish/subscribe for engine notifications.
//!
//! [`EventBus`] maps an event kind to the callbacks subscribed to it and fans
//! each fired event out to them in subscription order. The engine owns one bus
//! and fires [`FlightEvent`]s through it. The bus itself is generic over any
//! [`Event`] type.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use crashline_engine::events::{EventBus, EventKind, FlightEvent};
//!
//! let seen = Rc::new(Cell::new(0.0));
//! let sink = seen.clone();
//!
//! let mut bus = EventBus::<FlightEvent>::new();
//! bus.subscribe(EventKind::MultiplierUpdate, move |event| {
//!     if let FlightEvent::MultiplierUpdate(value) = event {
//!         sink.set(*value);
//!     }
//! });
//!
//! bus.fire(&FlightEvent::MultiplierUpdate(2.5));
//! assert_eq!(seen.get(), 2.5);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// An event that can be routed by kind.
pub trait Event {
    /// Routing key.
    type Kind: Copy + Eq + Hash + std::fmt::Debug;

    /// The routing key of this event.
    fn kind(&self) -> Self::Kind;
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback<E> = Box<dyn FnMut(&E)>;

/// Event kind -> subscribed callbacks.
pub struct EventBus<E: Event> {
    subscriptions: HashMap<E::Kind, Vec<(SubscriptionId, Callback<E>)>>,
    next_id: u64,
}

impl<E: Event> EventBus<E> {
    /// An empty bus.
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register `callback` for events of `kind`.
    pub fn subscribe(&mut self, kind: E::Kind, callback: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions
            .entry(kind)
            .or_default()
            .push((id, Box::new(callback)));
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered for
    /// `kind`.
    pub fn unsubscribe(&mut self, kind: E::Kind, id: SubscriptionId) -> bool {
        let Some(callbacks) = self.subscriptions.get_mut(&kind) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|(sub, _)| *sub != id);
        before != callbacks.len()
    }

    /// Invoke every callback subscribed to the event's kind.
    pub fn fire(&mut self, event: &E) {
        let kind = event.kind();
        let Some(callbacks) = self.subscriptions.get_mut(&kind) else {
            return;
        };
        tracing::trace!(?kind, subscribers = callbacks.len(), "firing event");
        for (_, callback) in callbacks.iter_mut() {
            callback(event);
        }
    }

    /// Drop every subscription.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    /// Number of callbacks subscribed to `kind`.
    pub fn subscriber_count(&self, kind: E::Kind) -> usize {
        self.subscriptions.get(&kind).map_or(0, Vec::len)
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self
            .subscriptions
            .iter()
            .map(|(kind, callbacks)| (*kind, callbacks.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("subscriptions", &counts)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// FlightEvent
// ---------------------------------------------------------------------------

/// Routing key of a [`FlightEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The multiplier changed.
    MultiplierUpdate,
    /// The round reached [`Stage::Finished`](crate::stage::Stage::Finished).
    Finish,
}

/// Notifications emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlightEvent {
    /// New multiplier value. Fired on every mutation, including the reset
    /// to 1.
    MultiplierUpdate(f64),
    /// Fired once on the transition into the finished stage.
    Finish,
}

impl Event for FlightEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            FlightEvent::MultiplierUpdate(_) => EventKind::MultiplierUpdate,
            FlightEvent::Finish => EventKind::Finish,
        }
    }
}
