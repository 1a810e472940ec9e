//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! mostly validation failures caught before anything reaches the
//! network boundary.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Task identifier is empty or otherwise malformed
    #[error("Invalid task id: {0:?}")]
    InvalidTaskId(String),

    /// Session page identifier is empty or otherwise malformed
    #[error("Invalid session page id: {0:?}")]
    InvalidSessionPageId(String),

    /// A delete was enqueued for a client-temporary id; the remote store
    /// never allocated it, so a delete must never be sent for it
    #[error("Refusing to enqueue delete for temporary id: {0}")]
    TempIdDelete(String),
}
