// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO event emission
// - Explicit SQL only

pub mod attribution_store;
pub mod memory_attribution_store;

pub use attribution_store::{AttributionStore, SqliteAttributionStore};
pub use memory_attribution_store::InMemoryAttributionStore;

#[cfg(test)]
pub use attribution_store::MockAttributionStore;
