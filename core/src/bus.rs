//! Typed publish/subscribe registry for world events.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::{Event, EventKind, HandlerError};

type Handler = Box<dyn FnMut(&Event) -> Result<(), HandlerError>>;

/// Handle returned by [`EventBus::on`] used to unsubscribe later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Outcome of publishing a single event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Handlers that accepted the event.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

impl Delivery {
    fn merge(self, other: Delivery) -> Self {
        Self {
            delivered: self.delivered + other.delivered,
            failed: self.failed + other.failed,
        }
    }
}

/// Synchronous event dispatcher keyed by [`EventKind`].
///
/// Handlers run in registration order. A failing or panicking handler is
/// logged and skipped; the remaining handlers still observe the event.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    handlers: BTreeMap<EventKind, Vec<(SubscriptionId, Handler)>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for every event of the provided kind.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) -> Result<(), HandlerError> + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Removes a handler. Returns `false` when the subscription was unknown.
    pub fn off(&mut self, kind: EventKind, id: SubscriptionId) -> bool {
        let Some(handlers) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(candidate, _)| *candidate != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            let _ = self.handlers.remove(&kind);
        }
        removed
    }

    /// Delivers the event to every handler registered for its kind.
    pub fn emit(&mut self, event: &Event) -> Delivery {
        let kind = event.kind();
        let mut delivery = Delivery::default();
        let Some(handlers) = self.handlers.get_mut(&kind) else {
            return delivery;
        };

        for (id, handler) in handlers.iter_mut() {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => delivery.delivered += 1,
                Ok(Err(error)) => {
                    delivery.failed += 1;
                    tracing::warn!(?kind, subscription = id.get(), %error, "bus.handler_failed");
                }
                Err(_) => {
                    delivery.failed += 1;
                    tracing::warn!(?kind, subscription = id.get(), "bus.handler_panicked");
                }
            }
        }
        delivery
    }

    /// Delivers each event in order and sums the outcomes.
    pub fn emit_all(&mut self, events: &[Event]) -> Delivery {
        events
            .iter()
            .fold(Delivery::default(), |total, event| total.merge(self.emit(event)))
    }

    /// Number of handlers registered for the provided kind.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<EventKind, usize> = self
            .handlers
            .iter()
            .map(|(kind, handlers)| (*kind, handlers.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("next_id", &self.next_id)
            .field("subscribers", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::{PlayerId, UnitId};

    fn turn_started() -> Event {
        Event::TurnStarted {
            player: PlayerId::new(0),
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for label in ["first", "second"] {
            let seen = Rc::clone(&seen);
            let _ = bus.on(EventKind::TurnStarted, move |_| {
                seen.borrow_mut().push(label);
                Ok(())
            });
        }

        let delivery = bus.emit(&turn_started());
        assert_eq!(delivery.delivered, 2);
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn events_only_reach_matching_kind() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let _ = bus.on(EventKind::UnitSelected, move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        let _ = bus.emit(&turn_started());
        let _ = bus.emit(&Event::UnitSelected {
            unit: UnitId::new(1),
        });
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn failing_handlers_do_not_stop_delivery() {
        let mut bus = EventBus::new();
        let reached = Rc::new(RefCell::new(false));
        let _ = bus.on(EventKind::TurnStarted, |_| Err(HandlerError::new("boom")));
        let _ = bus.on(EventKind::TurnStarted, |_| panic!("handler exploded"));
        let flag = Rc::clone(&reached);
        let _ = bus.on(EventKind::TurnStarted, move |_| {
            *flag.borrow_mut() = true;
            Ok(())
        });

        let delivery = bus.emit(&turn_started());
        assert_eq!(
            delivery,
            Delivery {
                delivered: 1,
                failed: 2
            }
        );
        assert!(*reached.borrow());
    }

    #[test]
    fn off_removes_only_the_named_subscription() {
        let mut bus = EventBus::new();
        let first = bus.on(EventKind::TurnEnded, |_| Ok(()));
        let _second = bus.on(EventKind::TurnEnded, |_| Ok(()));

        assert!(bus.off(EventKind::TurnEnded, first));
        assert!(!bus.off(EventKind::TurnEnded, first));
        assert!(!bus.off(EventKind::TurnStarted, first));
        assert_eq!(bus.subscriber_count(EventKind::TurnEnded), 1);
    }

    #[test]
    fn emit_all_sums_deliveries() {
        let mut bus = EventBus::new();
        let _ = bus.on(EventKind::TurnStarted, |_| Ok(()));
        let delivery = bus.emit_all(&[turn_started(), Event::UnitDeselected, turn_started()]);
        assert_eq!(delivery.delivered, 2);
        assert_eq!(delivery.failed, 0);
    }
}
