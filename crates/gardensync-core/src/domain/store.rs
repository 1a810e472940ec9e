//! Local task store - optimistic, ordered, synchronous
//!
//! The [`TaskStore`] maintains the authoritative in-memory ordered list of
//! tasks and applies all local mutations synchronously, recording a delta
//! in the owned [`DeltaQueue`] for everything the remote store still needs
//! to hear about. No operation here ever waits on the network.
//!
//! ## Sort views
//!
//! Sorting is a presentation concern: [`visible_tasks`](TaskStore::visible_tasks)
//! computes a view on demand from the canonical custom-order list, which
//! is never mutated by sorting. Switching back to [`SortMode::Custom`]
//! therefore restores the original sequence with every edit made while a
//! sorted view was active, structurally.

use super::delta::{DeltaQueue, PendingCreate, TaskPatch};
use super::newtypes::TaskId;
use super::task::{Task, TaskCommand};

// ============================================================================
// SortMode
// ============================================================================

/// Non-authoritative display ordering for the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// The user-arranged order; the source of truth
    #[default]
    Custom,
    /// Alphabetical by title, ascending
    TitleAsc,
    /// Alphabetical by title, descending
    TitleDesc,
    /// Completed tasks first, original relative order within each group
    CompletedFirst,
    /// Uncompleted tasks first, original relative order within each group
    UncompletedFirst,
}

// ============================================================================
// Applied
// ============================================================================

/// Result of applying a [`TaskCommand`]
#[derive(Debug, Clone, Default)]
pub struct Applied {
    /// Whether the command changed state and a sync should be scheduled
    pub dirty: bool,
    /// The newly created task, for `Create` commands
    pub created: Option<Task>,
}

// ============================================================================
// TaskStore
// ============================================================================

/// Authoritative, in-memory, ordered list of tasks plus the delta queue
///
/// All mutations are optimistic: they run to completion locally before any
/// network traffic happens, and they cannot fail. Validation problems
/// (blank title, unknown id) are silent no-ops per the UI contract.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    /// Canonical custom-order task list
    tasks: Vec<Task>,
    /// Operations not yet confirmed by the remote store
    queue: DeltaQueue,
    /// Active display ordering
    sort_mode: SortMode,
}

impl TaskStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded from a remote snapshot
    ///
    /// Loaded tasks carry server-assigned ids; the queue starts empty.
    #[must_use]
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            queue: DeltaQueue::new(),
            sort_mode: SortMode::default(),
        }
    }

    /// Applies a mutation command
    pub fn apply(&mut self, command: TaskCommand) -> Applied {
        match command {
            TaskCommand::Create { after, indent } => {
                let task = self.create_task(after.as_ref(), indent);
                Applied {
                    dirty: true,
                    created: Some(task),
                }
            }
            TaskCommand::Edit { id, title } => Applied {
                dirty: self.edit_task(&id, &title),
                created: None,
            },
            TaskCommand::Toggle { id } => Applied {
                dirty: self.toggle_completion(&id),
                created: None,
            },
            TaskCommand::Delete { id } => Applied {
                dirty: self.delete_task(&id),
                created: None,
            },
        }
    }

    /// Creates a new provisional task after the given anchor
    ///
    /// Generates a temporary id, inserts at the position following
    /// `after` (or at the end when absent/unknown), and enqueues a
    /// pending create capturing the anchor for the remote side. Returns
    /// the new task for immediate edit-mode entry.
    pub fn create_task(&mut self, after: Option<&TaskId>, indent: u32) -> Task {
        let task = Task::new_local(indent);

        let anchor = after.and_then(|id| self.index_of(id).map(|_| id.clone()));
        let position = match &anchor {
            Some(id) => self.index_of(id).map_or(self.tasks.len(), |i| i + 1),
            None => self.tasks.len(),
        };
        self.tasks.insert(position, task.clone());

        self.queue.enqueue_create(PendingCreate {
            client_temp_id: task.id.clone(),
            title: task.title.clone(),
            completed: task.completed,
            indent: task.indent,
            after: anchor,
            attempt_count: 0,
        });

        task
    }

    /// Replaces a task's title
    ///
    /// Blank (trimmed-empty) titles and unknown ids are silent no-ops.
    /// Returns true if state changed.
    pub fn edit_task(&mut self, id: &TaskId, new_title: &str) -> bool {
        if new_title.trim().is_empty() {
            return false;
        }
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.tasks[index].title = new_title.to_string();

        if id.is_temp() {
            // The create is still in flight; fold the edit into it
            if let Some(create) = self.queue.create_mut(id) {
                create.title = new_title.to_string();
            }
        } else {
            self.queue.upsert_update(id, TaskPatch::title(new_title));
        }
        true
    }

    /// Flips a task's completion state
    ///
    /// Unknown ids are a silent no-op. Returns true if state changed.
    pub fn toggle_completion(&mut self, id: &TaskId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let completed = !self.tasks[index].completed;
        self.tasks[index].completed = completed;

        if id.is_temp() {
            if let Some(create) = self.queue.create_mut(id) {
                create.completed = completed;
            }
        } else {
            self.queue.upsert_update(id, TaskPatch::completed(completed));
        }
        true
    }

    /// Removes a task from the list immediately
    ///
    /// Temp ids are purged from the queue and never sent remotely; real
    /// ids drop any pending update and enqueue a delete. Pending creates
    /// anchored on the deleted task reanchor onto its predecessor so the
    /// deleted id never ships as an `after` anchor. Returns true if a
    /// task was removed.
    pub fn delete_task(&mut self, id: &TaskId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let predecessor = index.checked_sub(1).map(|i| self.tasks[i].id.clone());
        self.tasks.remove(index);
        self.queue.reanchor_after(id, predecessor.as_ref());

        if id.is_temp() {
            self.queue.purge_all_for(id);
        } else {
            // Infallible for non-temp ids; enqueue_delete only rejects
            // temporary ids
            let _ = self.queue.enqueue_delete(id);
        }
        true
    }

    /// Substitutes a server-assigned id for a temporary one, content
    /// unchanged
    ///
    /// Returns true if a task carried the temporary id.
    pub fn substitute_id(&mut self, temp: &TaskId, assigned: &TaskId) -> bool {
        match self.index_of(temp) {
            Some(index) => {
                self.tasks[index].id = assigned.clone();
                true
            }
            None => false,
        }
    }

    /// Sets the active display ordering
    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.sort_mode = mode;
    }

    /// Returns the active display ordering
    #[must_use]
    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    /// The canonical custom-order task list
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The task list in the active display ordering
    ///
    /// Sorts are stable, so ties keep their canonical relative order.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<Task> {
        let mut view = self.tasks.clone();
        match self.sort_mode {
            SortMode::Custom => {}
            SortMode::TitleAsc => {
                view.sort_by_key(|t| t.title.to_lowercase());
            }
            SortMode::TitleDesc => {
                view.sort_by_key(|t| std::cmp::Reverse(t.title.to_lowercase()));
            }
            SortMode::CompletedFirst => {
                view.sort_by_key(|t| !t.completed);
            }
            SortMode::UncompletedFirst => {
                view.sort_by_key(|t| t.completed);
            }
        }
        view
    }

    /// Looks up a task by id
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// True iff any delta is awaiting confirmation
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        self.queue.has_pending()
    }

    /// Read access to the delta queue
    #[must_use]
    pub fn queue(&self) -> &DeltaQueue {
        &self.queue
    }

    /// Mutable access to the delta queue (reconciliation only)
    pub fn queue_mut(&mut self) -> &mut DeltaQueue {
        &mut self.queue
    }

    fn index_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }
}

// ============================================================================
// Unit tests
// ============================================================================
