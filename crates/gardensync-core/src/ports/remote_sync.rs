//! Remote sync port (driven/secondary port)
//!
//! The single network boundary of the core: one batched delta-sync call
//! per flush. Implementations carry the request over HTTP POST to the
//! per-session endpoint; the core only sees the typed contract.
//!
//! ## Design Notes
//!
//! - Uses a typed error enum rather than `anyhow` because the scheduler
//!   branches on the error class: transport and rejection errors are
//!   retried with backoff, auth expiry suspends sync entirely.
//! - Idempotence across a lost response is the remote store's concern;
//!   the core only guarantees it never enqueues the same logical delta
//!   twice and never double-applies a response.

use thiserror::Error;

use crate::wire::{SyncDeltaRequest, SyncDeltaResponse};

/// Errors from the remote sync boundary
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteSyncError {
    /// The call never produced a usable response (network failure,
    /// timeout, malformed body). Retryable.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server rejected the batch as a whole (non-2xx with detail).
    /// Retryable; the queue is left untouched.
    #[error("Sync rejected by remote: {0}")]
    Rejected(String),

    /// The session's credentials are no longer valid. Not retryable;
    /// sync must suspend and hand control back to the auth flow.
    #[error("Authentication expired, re-auth required")]
    AuthExpired,
}

impl RemoteSyncError {
    /// True if the scheduler should retry the same batch after backoff
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RemoteSyncError::AuthExpired)
    }
}

/// Port trait for the batched delta-sync call
///
/// At most one call is in flight at a time; the scheduler enforces this.
#[async_trait::async_trait]
pub trait RemoteSyncPort: Send + Sync {
    /// Sends one batch of pending deltas and returns the per-item outcome
    ///
    /// # Arguments
    /// * `request` - The batch built from a delta-queue snapshot
    ///
    /// # Errors
    /// Returns [`RemoteSyncError`] when the batch could not be processed
    /// at all; per-item failures arrive inside the `Ok` response.
    async fn sync_delta(
        &self,
        request: &SyncDeltaRequest,
    ) -> Result<SyncDeltaResponse, RemoteSyncError>;
}
