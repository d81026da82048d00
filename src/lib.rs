// src/lib.rs
// Install Attribution - resolves the one-time install referrer and serves it to every reader
//
// Architecture:
// - Domain-centric: outcome types are pure value objects
// - Explicit: collaborators are traits handed in by the composition root, no globals
// - Single writer, many readers: one terminal outcome per process

pub mod app;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod integrations;
pub mod repositories;
pub mod services;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{FailureReason, ResolutionOutcome, ResolverState, ResponseCode};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus, AttributionLookupStarted, AttributionResolved, DomainEvent, EventBus,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{AttributionStore, InMemoryAttributionStore, SqliteAttributionStore};

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{CompletionCallback, HttpReferrerClient, PayloadProvider, ServiceClient};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{AttributionParser, AttributionResolver, QueryParamParser};

// ============================================================================
// PUBLIC API - Application wiring
// ============================================================================

pub use app::{init_attribution_subsystem, AttributionConfig};
