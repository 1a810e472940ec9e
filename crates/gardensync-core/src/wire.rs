//! Wire contract for the delta-sync endpoint
//!
//! Defines the batch request/response DTOs exchanged with the per-session
//! `sync-delta` endpoint, JSON-encoded with camelCase field names to match
//! the remote side. These are boundary DTOs, not domain entities; the rest
//! of the core only ever sees the `Task` shape.
//!
//! The server processes deletes first (removing dependent updates on its
//! side too), then creates (grouped and ordered by shared `after` anchor),
//! then updates. A 200 response is returned even on partial per-item
//! failure; only a systemic error produces a non-2xx status.

use serde::{Deserialize, Serialize};

use crate::domain::delta::{DeltaQueue, PendingCreate, PendingUpdate};
use crate::domain::newtypes::{SessionPageId, TaskId};

// ============================================================================
// Request
// ============================================================================

/// Batched pending deltas for one flush
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDeltaRequest {
    /// The remote page this session syncs against
    pub session_page_id: SessionPageId,
    /// Pending creates, in enqueue order
    pub creates: Vec<PendingCreate>,
    /// Pending field-merged updates
    pub updates: Vec<PendingUpdate>,
    /// Deletes, sent as bare ids
    pub deletes: Vec<TaskId>,
}

impl SyncDeltaRequest {
    /// Builds a request from a queue snapshot
    ///
    /// Temporary ids are filtered out of the delete list here as well; the
    /// queue already rejects them at enqueue time, but a temp id must
    /// never leak into an outgoing batch regardless of how it got in.
    #[must_use]
    pub fn from_queue(session_page_id: &SessionPageId, queue: &DeltaQueue) -> Self {
        Self {
            session_page_id: session_page_id.clone(),
            creates: queue.creates().to_vec(),
            updates: queue.updates().to_vec(),
            deletes: queue
                .deletes()
                .iter()
                .map(|d| d.id.clone())
                .filter(|id| !id.is_temp())
                .collect(),
        }
    }

    /// True iff the request carries no operations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

// ============================================================================
// Response
// ============================================================================

/// Successful create confirmation, mapping temp id to server id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEntry {
    /// The client-generated temporary id that was sent
    pub client_temp_id: TaskId,
    /// The server-assigned durable id
    pub id: TaskId,
}

/// A create the server could not apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedCreate {
    /// The client-generated temporary id that was sent
    pub client_temp_id: TaskId,
    /// Server-side error description
    pub error: String,
    /// Attempt count as incremented by the server
    #[serde(default)]
    pub attempt_count: u32,
}

/// An update or delete the server could not apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedOp {
    /// The server-assigned id the operation targeted
    pub id: TaskId,
    /// Server-side error description
    pub error: String,
    /// Attempt count as incremented by the server
    #[serde(default)]
    pub attempt_count: u32,
}

/// Per-item failures from one flush
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedDeltas {
    /// Creates that failed
    #[serde(default)]
    pub created: Vec<FailedCreate>,
    /// Updates that failed
    #[serde(default)]
    pub updated: Vec<FailedOp>,
    /// Deletes that failed
    #[serde(default)]
    pub deleted: Vec<FailedOp>,
}

impl FailedDeltas {
    /// True iff nothing failed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Outcome of one flush, always returned with HTTP 200
///
/// Entries absent from both the success lists and `failed` were not
/// processed at all and stay queued for the next cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDeltaResponse {
    /// Confirmed creates with their assigned ids
    #[serde(default)]
    pub created: Vec<CreatedEntry>,
    /// Confirmed update ids
    #[serde(default)]
    pub updated: Vec<TaskId>,
    /// Confirmed delete ids
    #[serde(default)]
    pub deleted: Vec<TaskId>,
    /// Per-item failures
    #[serde(default)]
    pub failed: FailedDeltas,
}

/// Body of a non-2xx response from the sync endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncErrorBody {
    /// Human-readable error description
    #[serde(default)]
    pub error: String,
    /// When true, the caller must suspend sync and re-authenticate
    /// instead of retrying
    #[serde(default)]
    pub needs_reauth: bool,
}

// ============================================================================
// Unit tests
// ============================================================================
