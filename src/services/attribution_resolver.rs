// src/services/attribution_resolver.rs
//
// Attribution Resolver
//
// Resolves the install attribution once per process and hands the same answer to
// every reader, whether they ask before, during or after resolution.
//
// CRITICAL RULES:
// - initiate() runs once; later calls are ignored
// - At most one connection to the referrer service, closed exactly once by the
//   completion path
// - The outcome cell is written once; a terminal outcome never changes
// - Only a fresh Found is persisted; cached and failed outcomes never are
// - No fault reaches a resolve() caller; every error becomes a Failed outcome
//
// resolve() waits without a bound. Callers that need bounded latency use
// resolve_within().

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::app::config::ResolverConfig;
use crate::domain::{FailureReason, ResolutionOutcome, ResolverState, ResponseCode};
use crate::error::{AppError, AppResult};
use crate::events::{AttributionLookupStarted, AttributionResolved, EventBus};
use crate::integrations::referrer::{PayloadProvider, ServiceClient};
use crate::repositories::AttributionStore;
use crate::services::attribution_parser::AttributionParser;

// ============================================================================
// ATTRIBUTION RESOLVER
// ============================================================================

pub struct AttributionResolver {
    inner: Arc<ResolverInner>,
}

/// State shared with the completion callback
struct ResolverInner {
    store: Arc<dyn AttributionStore>,
    parser: Arc<dyn AttributionParser>,
    client: Arc<dyn ServiceClient>,
    event_bus: Arc<EventBus>,
    config: ResolverConfig,
    state: watch::Sender<ResolverState>,
    initiated: AtomicBool,
}

impl AttributionResolver {
    pub fn new(
        store: Arc<dyn AttributionStore>,
        parser: Arc<dyn AttributionParser>,
        client: Arc<dyn ServiceClient>,
        event_bus: Arc<EventBus>,
        config: ResolverConfig,
    ) -> Self {
        let (state, _) = watch::channel(ResolverState::Pending);

        Self {
            inner: Arc::new(ResolverInner {
                store,
                parser,
                client,
                event_bus,
                config,
                state,
                initiated: AtomicBool::new(false),
            }),
        }
    }

    /// Starts resolution. Call once, as early as possible.
    ///
    /// Answers synchronously from the store or from service discovery when it can;
    /// otherwise opens the service connection and returns without waiting for it.
    pub fn initiate(&self) {
        if self.inner.initiated.swap(true, Ordering::SeqCst) {
            log::warn!("[ATTRIBUTION] initiate() called more than once; ignoring");
            return;
        }

        let started = Instant::now();
        if let Err(e) = ResolverInner::begin(&self.inner, started) {
            log::warn!("[ATTRIBUTION] Failed to obtain referrer information: {}", e);
            self.inner
                .settle(ResolutionOutcome::failed(FailureReason::Unknown), started);
        }
    }

    /// Returns the terminal outcome, waiting for it if necessary.
    ///
    /// There is no timeout: if the service never answers, this never returns.
    /// Dropping the future stops waiting without affecting resolution.
    pub async fn resolve(&self) -> ResolutionOutcome {
        let mut rx = self.inner.state.subscribe();

        let current = rx.borrow().outcome();
        if let Some(outcome) = current {
            log::debug!("[ATTRIBUTION] Referrer already determined; immediately answering");
            return outcome;
        }

        log::debug!("[ATTRIBUTION] Waiting for referrer result");
        let resolved = rx
            .wait_for(ResolverState::is_resolved)
            .await
            .map(|state| state.outcome());

        match resolved {
            Ok(Some(outcome)) => outcome,
            // The sender lives as long as self, so this never settles
            _ => std::future::pending().await,
        }
    }

    /// resolve() with an upper bound on the wait.
    pub async fn resolve_within(&self, limit: Duration) -> AppResult<ResolutionOutcome> {
        tokio::time::timeout(limit, self.resolve())
            .await
            .map_err(|_| AppError::Timeout(limit))
    }

    /// Snapshot without waiting; Pending until resolved
    pub fn current(&self) -> ResolutionOutcome {
        self.inner
            .state
            .borrow()
            .outcome()
            .unwrap_or(ResolutionOutcome::Pending)
    }

    pub fn state(&self) -> ResolverState {
        self.inner.state.borrow().clone()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.state.borrow().is_resolved()
    }
}

impl ResolverInner {
    fn begin(inner: &Arc<Self>, started: Instant) -> AppResult<()> {
        if inner.store.has_checked_previously()? {
            let outcome = inner.load_previous()?;
            log::info!(
                "[ATTRIBUTION] Already inspected this referrer data. Took {}ms to load from disk",
                started.elapsed().as_millis()
            );
            inner.settle(outcome, started);
            return Ok(());
        }

        if !inner.client.discover()? {
            log::info!("[ATTRIBUTION] Referrer service not installed");
            inner.settle(
                ResolutionOutcome::failed(FailureReason::ServiceUnavailable),
                started,
            );
            return Ok(());
        }

        inner.mark_resolving();

        let callback_inner = Arc::clone(inner);
        inner.client.connect(Box::new(move |code: ResponseCode, payload: PayloadProvider| {
            callback_inner.on_complete(code, payload, started);
        }))?;

        inner.event_bus.emit(AttributionLookupStarted::new());
        Ok(())
    }

    fn load_previous(&self) -> AppResult<ResolutionOutcome> {
        Ok(match self.store.cached_value()? {
            Some(suffix) => {
                log::info!("[ATTRIBUTION] Already have referrer data from previous run - {}", suffix);
                ResolutionOutcome::found(suffix, true)
            }
            None => {
                log::info!("[ATTRIBUTION] Already saw referrer data, but no campaign suffix saved");
                ResolutionOutcome::not_found(true)
            }
        })
    }

    /// Completion event from the service. Runs at most once.
    ///
    /// Settles and disconnects even when the parser or the store panics.
    fn on_complete(&self, code: ResponseCode, payload: PayloadProvider, started: Instant) {
        log::info!(
            "[ATTRIBUTION] Took {}ms to get initial referral data callback",
            started.elapsed().as_millis()
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.classify(code, payload)))
            .unwrap_or_else(|_| {
                log::error!("[ATTRIBUTION] Referrer callback panicked; giving up");
                ResolutionOutcome::failed(FailureReason::Unknown)
            });

        self.settle(outcome, started);

        if let Err(e) = self.client.disconnect() {
            log::warn!("[ATTRIBUTION] Failed to close referrer connection: {}", e);
        }
    }

    fn classify(&self, code: ResponseCode, payload: PayloadProvider) -> ResolutionOutcome {
        match code.failure_reason() {
            None => match payload() {
                Ok(raw) => self.received(&raw),
                Err(e) => {
                    log::warn!("[ATTRIBUTION] Referrer payload unavailable: {}", e);
                    ResolutionOutcome::failed(FailureReason::Unknown)
                }
            },
            Some(reason) if reason.is_transient() => {
                log::info!(
                    "[ATTRIBUTION] Referrer service answered {}; a later run may still succeed",
                    code
                );
                ResolutionOutcome::failed(reason)
            }
            Some(reason) => {
                log::info!("[ATTRIBUTION] Referrer service answered {}", code);
                ResolutionOutcome::failed(reason)
            }
        }
    }

    fn received(&self, raw: &str) -> ResolutionOutcome {
        match self.parser.parse(raw) {
            Some(value) => {
                self.persist(|store| {
                    store.set_cached_value(&value)?;
                    store.set_checked_previously(true)
                });
                ResolutionOutcome::found(value, false)
            }
            None => {
                if self.config.persist_not_found {
                    self.persist(|store| store.set_checked_previously(true));
                }
                ResolutionOutcome::not_found(false)
            }
        }
    }

    /// The value was already obtained, so a failed write only costs the next run
    /// a fresh lookup.
    fn persist(&self, write: impl FnOnce(&dyn AttributionStore) -> AppResult<()>) {
        if let Err(e) = write(self.store.as_ref()) {
            log::warn!("[ATTRIBUTION] Could not persist referrer result: {}", e);
        }
    }

    fn mark_resolving(&self) {
        self.state.send_if_modified(|state| {
            if *state == ResolverState::Pending {
                *state = ResolverState::Resolving;
                true
            } else {
                false
            }
        });
    }

    /// Single write of the outcome cell; wakes every waiter.
    fn settle(&self, outcome: ResolutionOutcome, started: Instant) {
        debug_assert!(outcome.is_terminal());

        let settled = self.state.send_if_modified(|state| {
            if state.is_resolved() {
                return false;
            }
            *state = ResolverState::Resolved(outcome.clone());
            true
        });

        if settled {
            log::info!("[ATTRIBUTION] Resolved: {}", outcome);
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            self.event_bus.emit(AttributionResolved::new(outcome, elapsed_ms));
        } else {
            log::warn!("[ATTRIBUTION] Ignoring late outcome {}; already resolved", outcome);
        }
    }
}
