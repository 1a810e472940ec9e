//! Domain entities and business logic
//!
//! This module contains the core domain types for gardensync:
//! - Newtypes for type-safe identifiers
//! - The task entity and mutation command objects
//! - The pending-delta queue (creates, updates, deletes)
//! - The local task store with optimistic mutations and sort views
//! - The reconciler that folds sync responses back into local state
//! - Domain-specific error types

pub mod delta;
pub mod errors;
pub mod newtypes;
pub mod reconcile;
pub mod store;
pub mod task;

// Re-export commonly used types
pub use delta::{DeltaQueue, PendingCreate, PendingDelete, PendingUpdate, TaskPatch};
pub use errors::DomainError;
pub use newtypes::{SessionPageId, TaskId};
pub use reconcile::{DeltaKind, FailedDelta, ReconcileOutcome, DEFAULT_ATTEMPT_LIMIT};
pub use store::{Applied, SortMode, TaskStore};
pub use task::{Task, TaskCommand};
