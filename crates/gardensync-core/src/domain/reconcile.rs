//! Reconciliation - folding a sync response back into local state
//!
//! Given a [`SyncDeltaResponse`], the reconciler substitutes server ids
//! for temporary ones, prunes confirmed entries from the delta queue, and
//! applies the retry/abandon policy to per-item failures. The caller must
//! apply the whole response as one step relative to any new local
//! mutation, so an edit arriving mid-reconcile can never be misattributed
//! to a task whose id is being substituted.
//!
//! Confirmation is checked against the flushed request, not just the
//! response: an edit made while the batch was on the wire leaves the live
//! queue entry diverged from the snapshot that was sent, and the
//! divergent fields are carried forward as a fresh update against the
//! confirmed id instead of being dropped with the confirmed entry.
//!
//! ## Failure policy
//!
//! Entries absent from both the success lists and `failed` were never
//! processed; they stay queued untouched for the next cycle (the same
//! path a full request failure takes). Failed entries below the attempt
//! limit get their `attempt_count` bumped in place. At or over the limit
//! the entry is dropped from the queue and reported as abandoned, so a
//! poisoned delta cannot pin the "unsaved changes" indicator forever.

use super::delta::TaskPatch;
use super::newtypes::TaskId;
use super::store::TaskStore;
use crate::wire::{SyncDeltaRequest, SyncDeltaResponse};

/// Default number of flush attempts before a delta is abandoned
pub const DEFAULT_ATTEMPT_LIMIT: u32 = 3;

// ============================================================================
// Outcome types
// ============================================================================

/// Which kind of delta a failure report refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// A pending create
    Create,
    /// A pending update
    Update,
    /// A pending delete
    Delete,
}

impl std::fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeltaKind::Create => "create",
            DeltaKind::Update => "update",
            DeltaKind::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

/// A delta the server rejected, with its bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelta {
    /// Operation kind
    pub kind: DeltaKind,
    /// Target id (the temp id for creates)
    pub id: TaskId,
    /// Server-side error description
    pub error: String,
    /// Attempts consumed so far, after this failure
    pub attempts: u32,
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Confirmed creates as `(temp_id, assigned_id)` pairs
    pub confirmed_creates: Vec<(TaskId, TaskId)>,
    /// Confirmed update ids
    pub confirmed_updates: Vec<TaskId>,
    /// Confirmed delete ids
    pub confirmed_deletes: Vec<TaskId>,
    /// Failures that stay queued with a bumped attempt count
    pub retrying: Vec<FailedDelta>,
    /// Failures dropped from the queue after exhausting the attempt limit
    pub abandoned: Vec<FailedDelta>,
}

// ============================================================================
// apply_response
// ============================================================================

/// Folds a sync response into the store and its delta queue
///
/// # Arguments
/// * `store` - The local task store (owns the delta queue)
/// * `request` - The snapshot that was flushed, for divergence checks
/// * `response` - The server's outcome for the flushed batch
/// * `attempt_limit` - Attempts allowed before a delta is abandoned
pub fn apply_response(
    store: &mut TaskStore,
    request: &SyncDeltaRequest,
    response: &SyncDeltaResponse,
    attempt_limit: u32,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    // Confirmed creates: substitute the assigned id, drop the pending
    // create, and repoint any `after` anchors at the new id. Fields
    // edited while the batch was on the wire become an update against
    // the assigned id.
    for entry in &response.created {
        store.substitute_id(&entry.client_temp_id, &entry.id);
        let live = store.queue_mut().remove_create(&entry.client_temp_id);
        store
            .queue_mut()
            .rewrite_after_anchor(&entry.client_temp_id, &entry.id);
        if let Some(live) = live {
            let sent = request
                .creates
                .iter()
                .find(|c| c.client_temp_id == entry.client_temp_id);
            if let Some(sent) = sent {
                let patch = TaskPatch {
                    title: (live.title != sent.title).then(|| live.title.clone()),
                    completed: (live.completed != sent.completed).then_some(live.completed),
                };
                if patch != TaskPatch::default() {
                    store.queue_mut().upsert_update(&entry.id, patch);
                }
            }
        }
        outcome
            .confirmed_creates
            .push((entry.client_temp_id.clone(), entry.id.clone()));
    }

    // Confirmed updates and deletes: prune the queue, keeping any field
    // that diverged from the flushed snapshot while it was on the wire
    for id in &response.updated {
        let Some(live) = store.queue_mut().remove_update(id) else {
            continue;
        };
        if let Some(sent) = request.updates.iter().find(|u| &u.id == id) {
            let patch = TaskPatch {
                title: if live.title != sent.title {
                    live.title.clone()
                } else {
                    None
                },
                completed: if live.completed != sent.completed {
                    live.completed
                } else {
                    None
                },
            };
            if patch != TaskPatch::default() {
                store.queue_mut().upsert_update(id, patch);
            }
        }
        outcome.confirmed_updates.push(id.clone());
    }
    for id in &response.deleted {
        if store.queue_mut().remove_delete(id).is_some() {
            outcome.confirmed_deletes.push(id.clone());
        }
    }

    // Failed creates
    for failure in &response.failed.created {
        let Some(previous_attempts) = store
            .queue()
            .creates()
            .iter()
            .find(|c| c.client_temp_id == failure.client_temp_id)
            .map(|c| c.attempt_count)
        else {
            continue;
        };
        let attempts = previous_attempts + 1;
        let report = FailedDelta {
            kind: DeltaKind::Create,
            id: failure.client_temp_id.clone(),
            error: failure.error.clone(),
            attempts,
        };
        if attempts >= attempt_limit {
            store.queue_mut().remove_create(&failure.client_temp_id);
            // The create will never land; retract the provisional task
            store.delete_task(&failure.client_temp_id);
            outcome.abandoned.push(report);
        } else if let Some(entry) = store.queue_mut().create_mut(&failure.client_temp_id) {
            entry.attempt_count = attempts;
            outcome.retrying.push(report);
        }
    }

    // Failed updates
    for failure in &response.failed.updated {
        let Some(entry) = store
            .queue_mut()
            .updates()
            .iter()
            .find(|u| u.id == failure.id)
            .cloned()
        else {
            continue;
        };
        let attempts = entry.attempt_count + 1;
        let report = FailedDelta {
            kind: DeltaKind::Update,
            id: failure.id.clone(),
            error: failure.error.clone(),
            attempts,
        };
        if attempts >= attempt_limit {
            // Local state keeps the edit; the remote simply never saw it
            store.queue_mut().remove_update(&failure.id);
            outcome.abandoned.push(report);
        } else if let Some(pending) = store
            .queue_mut()
            .updates_mut()
            .iter_mut()
            .find(|u| u.id == failure.id)
        {
            pending.attempt_count = attempts;
            outcome.retrying.push(report);
        }
    }

    // Failed deletes
    for failure in &response.failed.deleted {
        let Some(entry) = store
            .queue_mut()
            .deletes()
            .iter()
            .find(|d| d.id == failure.id)
            .cloned()
        else {
            continue;
        };
        let attempts = entry.attempt_count + 1;
        let report = FailedDelta {
            kind: DeltaKind::Delete,
            id: failure.id.clone(),
            error: failure.error.clone(),
            attempts,
        };
        if attempts >= attempt_limit {
            // The optimistic local removal stands; the remote copy is
            // orphaned until the next session load re-reads it
            store.queue_mut().remove_delete(&failure.id);
            outcome.abandoned.push(report);
        } else if let Some(pending) = store
            .queue_mut()
            .deletes_mut()
            .iter_mut()
            .find(|d| d.id == failure.id)
        {
            pending.attempt_count = attempts;
            outcome.retrying.push(report);
        }
    }

    outcome
}

// ============================================================================
// Unit tests
// ============================================================================
