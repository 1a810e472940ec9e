//! Pending-delta collections and the delta queue
//!
//! The [`DeltaQueue`] holds every local mutation not yet confirmed by the
//! remote store, split into the three operation kinds the wire contract
//! understands: creates, updates, and deletes.
//!
//! Merge discipline:
//! - Updates are keyed by task id; repeated edits before a flush merge
//!   into one entry, last write wins per field.
//! - A delete purges any pending update for the same id.
//! - Deleting a never-synced temp task purges its pending create; nothing
//!   is ever sent for it.
//! - Temporary ids are rejected at delete-enqueue time; the remote store
//!   never allocated them.
//! - A deleted id never survives as an `after` anchor: dependent pending
//!   creates are reanchored onto the deleted task's predecessor.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::TaskId;

// ============================================================================
// Pending operation entries
// ============================================================================

/// A create operation awaiting a server-assigned id
///
/// Exists from optimistic creation until the server assigns a real id or
/// the temp task is deleted locally (in which case it is purged, never
/// sent). Edits to the provisional task mutate this entry in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCreate {
    /// Client-generated temporary id, echoed back by the server
    pub client_temp_id: TaskId,
    /// Title at flush time
    pub title: String,
    /// Completion state at flush time
    pub completed: bool,
    /// Nesting depth
    pub indent: u32,
    /// Task this one should be inserted after on the remote side
    /// (`None` = append per server convention)
    pub after: Option<TaskId>,
    /// Number of failed flush attempts so far
    #[serde(default)]
    pub attempt_count: u32,
}

/// A field-merged update operation for an already-synced task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUpdate {
    /// Server-assigned task id
    pub id: TaskId,
    /// New title, if the title changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New completion state, if it changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Number of failed flush attempts so far
    #[serde(default)]
    pub attempt_count: u32,
}

/// A delete operation for an already-synced task
///
/// Never holds a temporary id; those are discarded locally instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    /// Server-assigned task id
    pub id: TaskId,
    /// Number of failed flush attempts so far
    pub attempt_count: u32,
}

/// Partial fields for an update upsert; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title, if any
    pub title: Option<String>,
    /// New completion state, if any
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Patch that only changes the title
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            completed: None,
        }
    }

    /// Patch that only changes the completion state
    #[must_use]
    pub fn completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }
}

// ============================================================================
// DeltaQueue
// ============================================================================

/// Holds all pending operations not yet confirmed by the remote store
///
/// Mutated only from the owning thread; the sync engine clones a snapshot
/// before flushing so a failed flush leaves the queue untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaQueue {
    creates: Vec<PendingCreate>,
    updates: Vec<PendingUpdate>,
    deletes: Vec<PendingDelete>,
}

impl DeltaQueue {
    /// Creates an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pending create
    pub fn enqueue_create(&mut self, op: PendingCreate) {
        self.creates.push(op);
    }

    /// Merges partial fields into the pending update for `id`, creating
    /// the entry if none exists (last write wins per field)
    pub fn upsert_update(&mut self, id: &TaskId, patch: TaskPatch) {
        if let Some(existing) = self.updates.iter_mut().find(|u| &u.id == id) {
            if patch.title.is_some() {
                existing.title = patch.title;
            }
            if patch.completed.is_some() {
                existing.completed = patch.completed;
            }
        } else {
            self.updates.push(PendingUpdate {
                id: id.clone(),
                title: patch.title,
                completed: patch.completed,
                attempt_count: 0,
            });
        }
    }

    /// Enqueues a delete for a server-assigned id, purging any pending
    /// update for the same task (the delete takes precedence)
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::TempIdDelete`] for a temporary id. Blank ids
    /// cannot occur here; [`TaskId`] rejects them at construction.
    pub fn enqueue_delete(&mut self, id: &TaskId) -> Result<(), DomainError> {
        if id.is_temp() {
            return Err(DomainError::TempIdDelete(id.to_string()));
        }
        self.updates.retain(|u| &u.id != id);
        if !self.deletes.iter().any(|d| &d.id == id) {
            self.deletes.push(PendingDelete {
                id: id.clone(),
                attempt_count: 0,
            });
        }
        Ok(())
    }

    /// Removes every trace of `id` across all three collections
    ///
    /// Used when a temp task is deleted before ever syncing. Anchors in
    /// other pending creates that still reference the purged id are
    /// cleared so it can never ship in a later batch.
    pub fn purge_all_for(&mut self, id: &TaskId) {
        self.creates.retain(|c| &c.client_temp_id != id);
        self.updates.retain(|u| &u.id != id);
        self.deletes.retain(|d| &d.id != id);
        for create in &mut self.creates {
            if create.after.as_ref() == Some(id) {
                create.after = None;
            }
        }
    }

    /// Mutable access to the pending create for a temp id, if present
    ///
    /// Edits to a provisional task flow into its create entry instead of
    /// producing an update.
    pub fn create_mut(&mut self, client_temp_id: &TaskId) -> Option<&mut PendingCreate> {
        self.creates
            .iter_mut()
            .find(|c| &c.client_temp_id == client_temp_id)
    }

    /// Removes the pending create for `client_temp_id`, returning it
    pub fn remove_create(&mut self, client_temp_id: &TaskId) -> Option<PendingCreate> {
        let pos = self
            .creates
            .iter()
            .position(|c| &c.client_temp_id == client_temp_id)?;
        Some(self.creates.remove(pos))
    }

    /// Removes the pending update for `id`, returning it
    pub fn remove_update(&mut self, id: &TaskId) -> Option<PendingUpdate> {
        let pos = self.updates.iter().position(|u| &u.id == id)?;
        Some(self.updates.remove(pos))
    }

    /// Removes the pending delete for `id`, returning it
    pub fn remove_delete(&mut self, id: &TaskId) -> Option<PendingDelete> {
        let pos = self.deletes.iter().position(|d| &d.id == id)?;
        Some(self.deletes.remove(pos))
    }

    /// Rewrites `after` anchors that reference `old` to point at `new`
    ///
    /// Called when a create is confirmed, so still-pending creates keep
    /// their ordering intent when a batch is split across flushes.
    pub fn rewrite_after_anchor(&mut self, old: &TaskId, new: &TaskId) {
        self.reanchor_after(old, Some(new));
    }

    /// Repoints `after` anchors that reference `old` at `replacement`
    /// (`None` = append)
    ///
    /// Called when the anchor task is deleted, so dependent creates
    /// anchor on its predecessor instead of shipping a stale id.
    pub fn reanchor_after(&mut self, old: &TaskId, replacement: Option<&TaskId>) {
        for create in &mut self.creates {
            if create.after.as_ref() == Some(old) {
                create.after = replacement.cloned();
            }
        }
    }

    /// True iff any of the three collections is non-empty
    ///
    /// Drives the "syncing / unsaved changes" indicator.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.is_empty()
    }

    /// True iff there is nothing to flush
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// Pending creates, in enqueue order
    #[must_use]
    pub fn creates(&self) -> &[PendingCreate] {
        &self.creates
    }

    /// Pending updates, in first-touch order
    #[must_use]
    pub fn updates(&self) -> &[PendingUpdate] {
        &self.updates
    }

    /// Mutable access to pending updates (reconciliation bookkeeping only)
    pub fn updates_mut(&mut self) -> &mut [PendingUpdate] {
        &mut self.updates
    }

    /// Pending deletes, in enqueue order
    #[must_use]
    pub fn deletes(&self) -> &[PendingDelete] {
        &self.deletes
    }

    /// Mutable access to pending deletes (reconciliation bookkeeping only)
    pub fn deletes_mut(&mut self) -> &mut [PendingDelete] {
        &mut self.deletes
    }
}

// ============================================================================
// Unit tests
// ============================================================================
