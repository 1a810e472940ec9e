//! Task reader port (driven/secondary port)
//!
//! Thin read-only projection used once per session load: maps the remote
//! store's native representation into the `Task` shape before the engine
//! accepts any mutation.
//!
//! Uses `anyhow::Result` because errors at this boundary are
//! adapter-specific and don't need domain-level classification.

use crate::domain::newtypes::SessionPageId;
use crate::domain::task::Task;

/// Port trait for the session-load task snapshot
#[async_trait::async_trait]
pub trait TaskReaderPort: Send + Sync {
    /// Reads the remote task list for a session, in remote display order
    ///
    /// # Arguments
    /// * `session_page_id` - The page backing the session
    ///
    /// # Errors
    /// Returns an error if the remote snapshot cannot be read or decoded
    async fn load_tasks(&self, session_page_id: &SessionPageId) -> anyhow::Result<Vec<Task>>;
}
