//! World paired with an event bus for callback-driven hosts.

use ridgeline_core::{Catalog, Command, Event, EventBus};

use crate::{apply, World};

/// Owns a [`World`] and publishes every event it produces on an [`EventBus`].
#[derive(Debug, Default)]
pub struct Session {
    world: World,
    bus: EventBus,
}

impl Session {
    /// Creates a session around an empty world using the built-in catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session around an empty world using the provided catalog.
    #[must_use]
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            world: World::with_catalog(catalog),
            bus: EventBus::new(),
        }
    }

    /// Applies the command, publishes the resulting events and returns them.
    pub fn execute(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(&mut self.world, command, &mut events);
        let delivery = self.bus.emit_all(&events);
        if delivery.failed > 0 {
            tracing::debug!(
                delivered = delivery.delivered,
                failed = delivery.failed,
                "session.partial_delivery"
            );
        }
        events
    }

    /// Read-only access to the world for use with [`crate::query`].
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Event bus used to register and remove subscribers.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }
}
