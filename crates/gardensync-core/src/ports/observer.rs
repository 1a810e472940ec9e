//! Sync observer port (driven/secondary port)
//!
//! Non-fatal status reporting. The core never throws to the UI layer for
//! expected conditions; it pushes events through this port and updates
//! observable state the UI polls. Implementations are fire-and-forget
//! and must not block.

use crate::domain::reconcile::FailedDelta;

/// Port trait for non-blocking sync status notifications
pub trait SyncObserverPort: Send + Sync {
    /// A flush failed as a whole and will be retried after backoff
    ///
    /// Transient; nothing was lost.
    fn sync_failed(&self, message: &str);

    /// A delta exhausted its attempt limit and was dropped from the queue
    ///
    /// Permanent; should surface as a persistent user-visible failure.
    fn delta_abandoned(&self, delta: &FailedDelta);

    /// The remote rejected the session's credentials; sync is suspended
    /// until the caller re-authenticates
    fn reauth_required(&self);
}
