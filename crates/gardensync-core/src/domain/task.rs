//! Task entity and mutation commands
//!
//! A [`Task`] is a single to-do item as displayed to the user. Tasks are
//! exclusively owned by the [`TaskStore`](super::store::TaskStore);
//! pending-delta entries reference them by id only.
//!
//! [`TaskCommand`] expresses each optimistic mutation as an explicit
//! command object, decoupling "what mutation happened" from "how the UI
//! triggered it". The store applies commands synchronously; nothing here
//! ever blocks on network I/O.

use serde::{Deserialize, Serialize};

use super::newtypes::TaskId;

/// A single to-do item
///
/// Created locally with a temporary id (optimistic); becomes durable once
/// the reconciler substitutes the server-assigned id; removed when a
/// delete is confirmed or, for never-synced temp tasks, immediately on
/// local delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Durable remote id or client-temporary id
    pub id: TaskId,
    /// Display text, mutable
    pub title: String,
    /// Completion state, mutable
    pub completed: bool,
    /// Subtask nesting depth (0 = top-level)
    pub indent: u32,
}

impl Task {
    /// Creates a new, empty task with a fresh temporary id
    #[must_use]
    pub fn new_local(indent: u32) -> Self {
        Self {
            id: TaskId::new_temp(),
            title: String::new(),
            completed: false,
            indent,
        }
    }

    /// Returns true if this task has not yet been assigned a server id
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.id.is_temp()
    }
}

/// An optimistic local mutation, expressed as a command object
///
/// Commands are applied by [`TaskStore::apply`](super::store::TaskStore::apply)
/// and run to completion synchronously. Validation failures (blank title,
/// unknown id) are silent no-ops, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    /// Insert a new task after the given anchor (or append when `None`)
    Create {
        /// Task to insert after; `None` appends at the end
        after: Option<TaskId>,
        /// Nesting depth for the new task
        indent: u32,
    },
    /// Replace a task's title
    Edit {
        /// Target task
        id: TaskId,
        /// New title; blank (trimmed-empty) titles are ignored
        title: String,
    },
    /// Flip a task's completion state
    Toggle {
        /// Target task
        id: TaskId,
    },
    /// Remove a task from the list
    Delete {
        /// Target task
        id: TaskId,
    },
}
