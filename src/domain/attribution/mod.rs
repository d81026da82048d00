// src/domain/attribution/mod.rs
//
// Attribution Domain
//
// Value objects describing the install attribution outcome and the platform codes
// that feed it. Resolution itself (I/O, waiting, persistence) lives in services.
//
// CRITICAL RULES:
// - All types are pure value objects
// - No persistence
// - No event emission

pub mod response_code;
pub mod value_objects;

pub use response_code::ResponseCode;
pub use value_objects::{FailureReason, ResolutionOutcome, ResolverState};
