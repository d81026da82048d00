// src/events/mod.rs
//
// Internal Event System - Public API
//
// CRITICAL: EventHandler is INTERNAL and must NOT be exported

pub mod attribution_events;
pub mod bus;
pub mod types;

pub use types::DomainEvent;

pub use attribution_events::{AttributionLookupStarted, AttributionResolved};

pub use bus::EventBus;

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
