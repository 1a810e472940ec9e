//! Gardensync Sync - Debounced delta synchronization
//!
//! Provides:
//! - A debounced sync scheduler that coalesces bursts of local edits into
//!   one flush per quiet period, with retry-with-backoff on failure
//! - A sync engine that owns the session state and drives flush cycles
//!   through the core's ports
//!
//! ## Modules
//!
//! - [`engine`] - Sync engine orchestrating optimistic mutations and flushes
//! - [`scheduler`] - Debounce / backoff state machine

pub mod engine;
pub mod scheduler;

use gardensync_core::domain::reconcile::FailedDelta;
use gardensync_core::ports::SyncObserverPort;
use tracing::{error, warn};

/// Default [`SyncObserverPort`] that reports through `tracing`
///
/// Suitable for headless use and tests; UI layers provide their own
/// observer to surface toasts.
#[derive(Debug, Default)]
pub struct TracingSyncObserver;

impl SyncObserverPort for TracingSyncObserver {
    fn sync_failed(&self, message: &str) {
        warn!(message, "Sync flush failed, will retry");
    }

    fn delta_abandoned(&self, delta: &FailedDelta) {
        error!(
            kind = %delta.kind,
            id = %delta.id,
            error = %delta.error,
            attempts = delta.attempts,
            "Delta abandoned after exhausting attempts"
        );
    }

    fn reauth_required(&self) {
        error!("Remote session expired, sync suspended until re-authentication");
    }
}
