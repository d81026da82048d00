// src/domain/attribution/value_objects.rs
//
// Attribution Value Objects
//
// Pure, immutable data describing where install attribution resolution stands.
//
// CRITICAL INVARIANTS:
// - A terminal outcome never changes once produced
// - Pending is never handed to a resolve() caller
// - No side effects, no I/O
// - Clone + Debug + Serialize for traceability

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// FAILURE REASON
// ============================================================================

/// Why resolution ended without a payload.
///
/// Every reason is terminal for the rest of the process; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The platform referrer service is not installed or not reachable at all
    ServiceUnavailable,

    /// The platform rejected the request as unsupported
    FeatureNotSupported,

    /// The connection to the service could not be established
    ServiceConnectFailed,

    /// The platform reports that the request was malformed
    DeveloperMisconfiguration,

    /// The service dropped the connection before answering
    ServiceDisconnectedBeforeAnswer,

    /// Catch-all for unexpected faults during initiation or callback handling
    Unknown,
}

impl FailureReason {
    /// Environment failures mean this device will never answer; transient ones might
    /// on a later process run.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureReason::ServiceConnectFailed | FailureReason::ServiceDisconnectedBeforeAnswer
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureReason::ServiceUnavailable => "service_unavailable",
            FailureReason::FeatureNotSupported => "feature_not_supported",
            FailureReason::ServiceConnectFailed => "service_connect_failed",
            FailureReason::DeveloperMisconfiguration => "developer_misconfiguration",
            FailureReason::ServiceDisconnectedBeforeAnswer => "service_disconnected_before_answer",
            FailureReason::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

// ============================================================================
// RESOLUTION OUTCOME
// ============================================================================

/// The single answer to "where did this install come from?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// No terminal answer yet
    Pending,

    /// An attribution payload was obtained
    Found { value: String, from_cache: bool },

    /// The service or the cache definitively reported no attribution
    NotFound { from_cache: bool },

    /// Resolution ended without a value
    Failed { reason: FailureReason },
}

impl ResolutionOutcome {
    pub fn found(value: impl Into<String>, from_cache: bool) -> Self {
        ResolutionOutcome::Found {
            value: value.into(),
            from_cache,
        }
    }

    pub fn not_found(from_cache: bool) -> Self {
        ResolutionOutcome::NotFound { from_cache }
    }

    pub fn failed(reason: FailureReason) -> Self {
        ResolutionOutcome::Failed { reason }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ResolutionOutcome::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// The attribution value, if one was found
    pub fn value(&self) -> Option<&str> {
        match self {
            ResolutionOutcome::Found { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            ResolutionOutcome::Failed { reason } => Some(*reason),
            _ => None,
        }
    }

    /// True only for outcomes replayed from the store
    pub fn is_from_cache(&self) -> bool {
        match self {
            ResolutionOutcome::Found { from_cache, .. } => *from_cache,
            ResolutionOutcome::NotFound { from_cache } => *from_cache,
            _ => false,
        }
    }
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionOutcome::Pending => write!(f, "pending"),
            ResolutionOutcome::Found { value, from_cache } => {
                write!(f, "found({}, from_cache={})", value, from_cache)
            }
            ResolutionOutcome::NotFound { from_cache } => {
                write!(f, "not_found(from_cache={})", from_cache)
            }
            ResolutionOutcome::Failed { reason } => write!(f, "failed({})", reason),
        }
    }
}

// ============================================================================
// RESOLVER STATE
// ============================================================================

/// Phase of the resolver: Pending -> Resolving -> Resolved.
///
/// Pending and Resolving are both "not yet answerable".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResolverState {
    #[default]
    Pending,
    Resolving,
    Resolved(ResolutionOutcome),
}

impl ResolverState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolverState::Resolved(_))
    }

    /// The terminal outcome, once there is one
    pub fn outcome(&self) -> Option<ResolutionOutcome> {
        match self {
            ResolverState::Resolved(outcome) => Some(outcome.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let found = ResolutionOutcome::found("xyz", false);
        assert_eq!(found.value(), Some("xyz"));
        assert!(!found.is_from_cache());
        assert!(found.is_terminal());

        let cached = ResolutionOutcome::not_found(true);
        assert_eq!(cached.value(), None);
        assert!(cached.is_from_cache());

        let failed = ResolutionOutcome::failed(FailureReason::DeveloperMisconfiguration);
        assert_eq!(
            failed.failure_reason(),
            Some(FailureReason::DeveloperMisconfiguration)
        );
        assert!(!failed.is_from_cache());

        assert!(ResolutionOutcome::Pending.is_pending());
        assert!(!ResolutionOutcome::Pending.is_terminal());
    }

    #[test]
    fn test_outcome_serializes_as_tagged_variant() {
        let json = serde_json::to_value(ResolutionOutcome::found("abc", true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "found", "value": "abc", "from_cache": true })
        );

        let json = serde_json::to_value(ResolutionOutcome::failed(
            FailureReason::ServiceDisconnectedBeforeAnswer,
        ))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "failed", "reason": "service_disconnected_before_answer" })
        );
    }

    #[test]
    fn test_transient_reasons() {
        assert!(FailureReason::ServiceConnectFailed.is_transient());
        assert!(FailureReason::ServiceDisconnectedBeforeAnswer.is_transient());
        assert!(!FailureReason::ServiceUnavailable.is_transient());
        assert!(!FailureReason::Unknown.is_transient());
    }

    #[test]
    fn test_state_exposes_outcome_only_when_resolved() {
        assert_eq!(ResolverState::Pending.outcome(), None);
        assert_eq!(ResolverState::Resolving.outcome(), None);
        assert!(!ResolverState::Resolving.is_resolved());

        let state = ResolverState::Resolved(ResolutionOutcome::not_found(false));
        assert!(state.is_resolved());
        assert_eq!(state.outcome(), Some(ResolutionOutcome::not_found(false)));
    }
}
