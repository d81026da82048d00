// src/events/attribution_events.rs
//
// Attribution Events
//
// Emitted by the resolver; each one at most once per resolver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ResolutionOutcome;
use crate::events::DomainEvent;

/// Emitted once the resolver has opened its one connection to the referrer service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionLookupStarted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl AttributionLookupStarted {
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }
}

impl Default for AttributionLookupStarted {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainEvent for AttributionLookupStarted {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "AttributionLookupStarted"
    }
}

/// Emitted when the resolver reaches its terminal outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionResolved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub outcome: ResolutionOutcome,
    /// Time from initiate() to the terminal transition
    pub elapsed_ms: u64,
}

impl AttributionResolved {
    pub fn new(outcome: ResolutionOutcome, elapsed_ms: u64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            outcome,
            elapsed_ms,
        }
    }
}

impl DomainEvent for AttributionResolved {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "AttributionResolved"
    }
}
