//! Sync scheduler - coalesces edit bursts into debounced flush cycles
//!
//! The [`SyncScheduler`] sits between local mutations and the network
//! boundary. Mutations report themselves through a [`SyncSignal`]; the
//! scheduler waits for a quiet period, then asks its [`FlushTarget`] to
//! flush the accumulated deltas exactly once.
//!
//! ## State machine
//!
//! ```text
//! Idle ──signal──▶ Scheduled ──quiet period──▶ Syncing ──ok──▶ Idle
//!                     ▲  │                        │
//!                     └──┘ (each signal           └─fail─▶ backoff, retry
//!                          restarts the timer)             same batch
//! ```
//!
//! Only the *last* edit in a burst triggers the flush, bounding network
//! calls to one per quiet period regardless of edit frequency. At most
//! one flush is in flight at any time; signals arriving while Syncing
//! stay queued in the channel and start the next Scheduled cycle once the
//! in-flight call resolves. Failures retry the same queue contents after
//! a longer fixed delay, indefinitely; only an auth expiry stops the
//! loop.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Capacity of the change-signal channel; signals are coalesced, so a
/// full channel loses nothing as long as one signal remains queued
const CHANGE_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// SyncSignal
// ============================================================================

/// Cheap, cloneable handle that mutation sites use to request a sync
#[derive(Debug, Clone)]
pub struct SyncSignal {
    tx: mpsc::Sender<()>,
}

impl SyncSignal {
    /// Records that local state changed and a flush should be scheduled
    ///
    /// Never blocks. A full channel is fine: a queued signal already
    /// guarantees a future flush will pick up the new deltas. A closed
    /// channel (scheduler stopped) is ignored; the deltas stay queued
    /// for whoever restarts sync.
    pub fn mark_changed(&self) {
        match self.tx.try_send(()) {
            Ok(()) => debug!("Change signal sent to scheduler"),
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("Change channel full, flush already guaranteed");
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!("Scheduler stopped, change recorded locally only");
            }
        }
    }
}

// ============================================================================
// FlushTarget
// ============================================================================

/// Result of one flush attempt, as seen by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The batch was sent and the response reconciled
    Synced,
    /// The delta queue was empty; nothing was sent
    NothingToSend,
    /// The batch failed as a whole; the queue is untouched and the same
    /// contents should be retried after backoff
    Failed,
    /// Credentials expired; sync must suspend entirely
    AuthExpired,
}

/// The thing the scheduler flushes - implemented by the sync engine
#[async_trait::async_trait]
pub trait FlushTarget: Send + Sync {
    /// Sends the current delta-queue contents and reconciles the response
    async fn flush(&self) -> FlushOutcome;
}

// ============================================================================
// SyncScheduler
// ============================================================================

/// Debounce / backoff state machine driving flush cycles
///
/// Owns the receiving half of the change-signal channel. Run it with
/// [`run`](SyncScheduler::run) on a spawned task; it terminates when
/// every [`SyncSignal`] clone is dropped or when the target reports auth
/// expiry.
pub struct SyncScheduler {
    /// Receiver for change signals from mutation sites
    change_rx: mpsc::Receiver<()>,
    /// Quiet period after the last edit before a flush
    debounce: Duration,
    /// Fixed delay before retrying a failed flush
    retry_backoff: Duration,
}

impl SyncScheduler {
    /// Creates a scheduler and the signal handle that feeds it
    ///
    /// # Arguments
    /// * `debounce` - Quiet period after the last edit before flushing
    /// * `retry_backoff` - Delay before retrying a failed flush
    #[must_use]
    pub fn new(debounce: Duration, retry_backoff: Duration) -> (Self, SyncSignal) {
        let (tx, change_rx) = mpsc::channel(CHANGE_CHANNEL_CAPACITY);

        info!(
            debounce_ms = debounce.as_millis() as u64,
            backoff_ms = retry_backoff.as_millis() as u64,
            "Creating sync scheduler"
        );

        (
            Self {
                change_rx,
                debounce,
                retry_backoff,
            },
            SyncSignal { tx },
        )
    }

    /// Main loop: Idle → Scheduled → Syncing, forever
    ///
    /// Returns when the signal channel closes (after flushing whatever is
    /// still pending) or when the target reports [`FlushOutcome::AuthExpired`].
    pub async fn run(mut self, target: Arc<dyn FlushTarget>) {
        info!("Sync scheduler starting");

        'cycles: loop {
            // Idle: wait for the first change of a burst
            if self.change_rx.recv().await.is_none() {
                info!("Change channel closed while idle, scheduler shutting down");
                break;
            }
            debug!("Change received, debounce window started");

            // Scheduled: every further signal restarts the quiet-period
            // timer, so only the last edit of a burst triggers the flush
            let mut channel_closed = false;
            loop {
                match tokio::time::timeout(self.debounce, self.change_rx.recv()).await {
                    Ok(Some(())) => {
                        debug!("Change during debounce window, timer restarted");
                    }
                    Ok(None) => {
                        info!("Change channel closed, flushing remaining deltas");
                        channel_closed = true;
                        break;
                    }
                    Err(_) => break, // quiet period elapsed
                }
            }

            // Syncing: one flush at a time, retrying the same batch on
            // failure until it lands or auth expires
            loop {
                match target.flush().await {
                    FlushOutcome::Synced => {
                        debug!("Flush completed");
                        break;
                    }
                    FlushOutcome::NothingToSend => {
                        debug!("Nothing to flush");
                        break;
                    }
                    FlushOutcome::AuthExpired => {
                        warn!("Auth expired, scheduler suspending");
                        break 'cycles;
                    }
                    FlushOutcome::Failed => {
                        warn!(
                            backoff_ms = self.retry_backoff.as_millis() as u64,
                            "Flush failed, retrying same batch after backoff"
                        );
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                }
            }

            if channel_closed {
                break;
            }
        }

        info!("Sync scheduler stopped");
    }
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Flush target that replays a script of outcomes and counts calls
    struct ScriptedTarget {
        calls: AtomicUsize,
        script: Mutex<Vec<FlushOutcome>>,
    }

    impl ScriptedTarget {
        fn new(mut outcomes: Vec<FlushOutcome>) -> Arc<Self> {
            outcomes.reverse();
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(outcomes),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl FlushTarget for ScriptedTarget {
        async fn flush(&self) -> FlushOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(FlushOutcome::NothingToSend)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_flush() {
        let (scheduler, signal) =
            SyncScheduler::new(Duration::from_secs(2), Duration::from_secs(4));
        let target = ScriptedTarget::new(vec![FlushOutcome::Synced]);
        let handle = tokio::spawn(scheduler.run(target.clone()));

        // Five rapid edits within the debounce window
        for _ in 0..5 {
            signal.mark_changed();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(target.calls(), 1);

        drop(signal);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_flush_before_quiet_period() {
        let (scheduler, signal) =
            SyncScheduler::new(Duration::from_secs(2), Duration::from_secs(4));
        let target = ScriptedTarget::new(vec![FlushOutcome::Synced]);
        let handle = tokio::spawn(scheduler.run(target.clone()));

        signal.mark_changed();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(target.calls(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(target.calls(), 1);

        drop(signal);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flush_retries_after_backoff() {
        let (scheduler, signal) =
            SyncScheduler::new(Duration::from_secs(2), Duration::from_secs(4));
        let target =
            ScriptedTarget::new(vec![FlushOutcome::Failed, FlushOutcome::Synced]);
        let handle = tokio::spawn(scheduler.run(target.clone()));

        signal.mark_changed();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(target.calls(), 1);

        // Backoff is 4s; the retry of the same batch fires after it
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(target.calls(), 2);

        drop(signal);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_changes_after_flush_start_new_cycle() {
        let (scheduler, signal) =
            SyncScheduler::new(Duration::from_secs(2), Duration::from_secs(4));
        let target =
            ScriptedTarget::new(vec![FlushOutcome::Synced, FlushOutcome::Synced]);
        let handle = tokio::spawn(scheduler.run(target.clone()));

        signal.mark_changed();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(target.calls(), 1);

        signal.mark_changed();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(target.calls(), 2);

        drop(signal);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_expiry_stops_scheduler() {
        let (scheduler, signal) =
            SyncScheduler::new(Duration::from_secs(2), Duration::from_secs(4));
        let target = ScriptedTarget::new(vec![FlushOutcome::AuthExpired]);
        let handle = tokio::spawn(scheduler.run(target.clone()));

        signal.mark_changed();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(target.calls(), 1);

        // The loop has exited; further signals cannot trigger flushes
        handle.await.unwrap();
        signal.mark_changed();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(target.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_close_flushes_remaining() {
        let (scheduler, signal) =
            SyncScheduler::new(Duration::from_secs(60), Duration::from_secs(4));
        let target = ScriptedTarget::new(vec![FlushOutcome::Synced]);
        let handle = tokio::spawn(scheduler.run(target.clone()));

        signal.mark_changed();
        tokio::time::sleep(Duration::from_millis(10)).await;
        // Dropping the only signal closes the channel mid-debounce; the
        // scheduler flushes what it has instead of losing the batch
        drop(signal);

        handle.await.unwrap();
        assert_eq!(target.calls(), 1);
    }
}
