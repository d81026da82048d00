// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod attribution;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use attribution::{FailureReason, ResolutionOutcome, ResolverState, ResponseCode};
