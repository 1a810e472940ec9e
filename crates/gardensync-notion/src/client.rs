//! HTTP client for the delta-sync backend
//!
//! Carries the core's wire contract over HTTP: one POST per flush to the
//! per-session `sync-delta` endpoint, plus the read-only block snapshot
//! used at session load. Every request carries an explicit timeout so a
//! dead connection cannot wedge the scheduler's Syncing state.
//!
//! ## Error mapping
//!
//! - Connection/timeout/decode problems → [`RemoteSyncError::Transport`]
//!   (retried with backoff, queue untouched)
//! - Non-2xx with `needsReauth` (or a 401) → [`RemoteSyncError::AuthExpired`]
//!   (sync suspends; the auth flow takes over)
//! - Any other non-2xx → [`RemoteSyncError::Rejected`] with the server's
//!   error text

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use gardensync_core::domain::{SessionPageId, Task};
use gardensync_core::ports::{RemoteSyncError, RemoteSyncPort, TaskReaderPort};
use gardensync_core::wire::{SyncDeltaRequest, SyncDeltaResponse, SyncErrorBody};

use crate::blocks::{task_from_block, RemoteBlock};

/// Response from the block-snapshot endpoint
#[derive(Debug, Deserialize)]
struct BlockListResponse {
    #[serde(default)]
    results: Vec<RemoteBlock>,
}

// ============================================================================
// NotionSyncClient
// ============================================================================

/// HTTP adapter for the sync backend
///
/// Implements both network-facing ports: [`RemoteSyncPort`] for flushes
/// and [`TaskReaderPort`] for the session-load snapshot.
pub struct NotionSyncClient {
    /// The underlying HTTP client, configured with the request timeout
    client: Client,
    /// Base URL for API requests
    base_url: String,
}

impl NotionSyncClient {
    /// Creates a client for the given backend
    ///
    /// # Arguments
    /// * `base_url` - Backend base URL, without a trailing slash
    /// * `request_timeout` - Per-request deadline
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn sync_url(&self, session: &SessionPageId) -> String {
        format!("{}/sessions/{}/sync-delta", self.base_url, session)
    }

    fn blocks_url(&self, session: &SessionPageId) -> String {
        format!("{}/sessions/{}/blocks", self.base_url, session)
    }
}

#[async_trait::async_trait]
impl RemoteSyncPort for NotionSyncClient {
    async fn sync_delta(
        &self,
        request: &SyncDeltaRequest,
    ) -> Result<SyncDeltaResponse, RemoteSyncError> {
        let url = self.sync_url(&request.session_page_id);
        debug!(
            url = %url,
            creates = request.creates.len(),
            updates = request.updates.len(),
            deletes = request.deletes.len(),
            "POST sync-delta"
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| RemoteSyncError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<SyncDeltaResponse>()
                .await
                .map_err(|err| RemoteSyncError::Transport(format!("malformed response: {err}")));
        }

        // Systemic failure; the body carries detail when the backend is
        // still coherent enough to produce one
        let body: SyncErrorBody = response.json().await.unwrap_or_default();
        if body.needs_reauth || status == StatusCode::UNAUTHORIZED {
            return Err(RemoteSyncError::AuthExpired);
        }
        let detail = if body.error.is_empty() {
            status.to_string()
        } else {
            body.error
        };
        Err(RemoteSyncError::Rejected(format!("{status}: {detail}")))
    }
}

#[async_trait::async_trait]
impl TaskReaderPort for NotionSyncClient {
    async fn load_tasks(&self, session_page_id: &SessionPageId) -> Result<Vec<Task>> {
        let url = self.blocks_url(session_page_id);
        debug!(url = %url, "GET session blocks");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch session blocks")?
            .error_for_status()
            .context("Block snapshot request rejected")?;

        let list: BlockListResponse = response
            .json()
            .await
            .context("Failed to decode block snapshot")?;

        let mut tasks = Vec::with_capacity(list.results.len());
        for block in &list.results {
            match task_from_block(block) {
                Ok(Some(task)) => tasks.push(task),
                Ok(None) => {}
                Err(err) => {
                    // One malformed block must not sink the whole snapshot
                    warn!(block_id = %block.id, error = %err, "Skipping malformed block");
                }
            }
        }

        debug!(count = tasks.len(), "Session snapshot loaded");
        Ok(tasks)
    }
}

// ============================================================================
// Unit tests
// ============================================================================
