//! Sync engine - optimistic session state plus flush orchestration
//!
//! The [`SyncEngine`] owns the per-session state (task store + delta
//! queue) behind a single mutex shared between the UI-facing mutation
//! methods and the scheduler-driven flush path. Mutations are short
//! synchronous critical sections that never wait on the network; the
//! network call happens outside the lock against a queue snapshot, and
//! the reconciler reapplies the response under the lock as one atomic
//! step, so a new edit can never be misattributed to a task whose id is
//! mid-substitution.
//!
//! ## Flush cycle
//!
//! 1. Under the lock: snapshot the queue into a [`SyncDeltaRequest`]
//!    (empty queue → nothing to send)
//! 2. Outside the lock: one `sync_delta` call, at most one in flight
//! 3. Under the lock: reconcile the response (id substitution, queue
//!    pruning, retry/abandon bookkeeping)
//!
//! A failed call touches nothing: the queue still holds the exact batch,
//! and the scheduler retries it after backoff.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use tracing::{debug, info, warn};

use gardensync_core::config::SyncConfig;
use gardensync_core::domain::reconcile::{self, FailedDelta};
use gardensync_core::domain::{Applied, SessionPageId, SortMode, Task, TaskCommand, TaskId, TaskStore};
use gardensync_core::ports::{RemoteSyncError, RemoteSyncPort, SyncObserverPort, TaskReaderPort};
use gardensync_core::wire::SyncDeltaRequest;

use crate::scheduler::{FlushOutcome, FlushTarget, SyncScheduler, SyncSignal};

// ============================================================================
// SyncStatus
// ============================================================================

/// Observable sync state for a polling UI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// True while any delta awaits confirmation ("unsaved changes")
    pub has_pending: bool,
    /// True while a flush call is on the wire
    pub in_flight: bool,
    /// Most recent flush error, cleared on the next successful flush
    pub last_error: Option<String>,
    /// True once the remote demanded re-authentication; no further
    /// flushes happen until a new engine is built with fresh credentials
    pub auth_suspended: bool,
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Per-session state guarded by the engine mutex
#[derive(Debug, Default)]
struct SessionState {
    store: TaskStore,
    in_flight: bool,
    last_error: Option<String>,
    auth_suspended: bool,
}

/// Orchestrates one session's optimistic task list and its sync lifecycle
///
/// Construction also yields the [`SyncScheduler`] that drives flushes;
/// spawn its `run` loop with the engine as target:
///
/// ```ignore
/// let (engine, scheduler) = SyncEngine::new(session, remote, observer, &config.sync);
/// tokio::spawn(scheduler.run(engine.clone()));
/// ```
pub struct SyncEngine {
    session_page_id: SessionPageId,
    state: Mutex<SessionState>,
    remote: Arc<dyn RemoteSyncPort>,
    observer: Arc<dyn SyncObserverPort>,
    signal: SyncSignal,
    attempt_limit: u32,
}

impl SyncEngine {
    /// Creates an engine and its scheduler
    ///
    /// # Arguments
    /// * `session_page_id` - The remote page this session syncs against
    /// * `remote` - Adapter for the delta-sync endpoint
    /// * `observer` - Sink for non-fatal status notifications
    /// * `config` - Debounce, backoff, and attempt-limit settings
    #[must_use]
    pub fn new(
        session_page_id: SessionPageId,
        remote: Arc<dyn RemoteSyncPort>,
        observer: Arc<dyn SyncObserverPort>,
        config: &SyncConfig,
    ) -> (Arc<Self>, SyncScheduler) {
        let (scheduler, signal) = SyncScheduler::new(config.debounce_delay(), config.retry_backoff());

        info!(
            session = %session_page_id,
            attempt_limit = config.attempt_limit,
            "Creating sync engine"
        );

        let engine = Arc::new(Self {
            session_page_id,
            state: Mutex::new(SessionState::default()),
            remote,
            observer,
            signal,
            attempt_limit: config.attempt_limit,
        });

        (engine, scheduler)
    }

    /// Seeds the store from the remote snapshot at session-load time
    ///
    /// # Errors
    /// Fails if the remote snapshot cannot be read, or if local edits are
    /// already pending (reloading would silently discard them).
    pub async fn load_session(&self, reader: &dyn TaskReaderPort) -> anyhow::Result<usize> {
        let tasks = reader
            .load_tasks(&self.session_page_id)
            .await
            .context("Failed to load remote task snapshot")?;

        let mut state = self.lock();
        if state.store.has_pending_changes() {
            anyhow::bail!("refusing to reload session over pending local changes");
        }
        let count = tasks.len();
        state.store = TaskStore::from_tasks(tasks);
        info!(count, "Session loaded from remote snapshot");
        Ok(count)
    }

    /// Applies a mutation command and schedules a sync if state changed
    pub fn apply(&self, command: TaskCommand) -> Applied {
        let applied = {
            let mut state = self.lock();
            state.store.apply(command)
        };
        if applied.dirty {
            self.signal.mark_changed();
        }
        applied
    }

    /// Creates a new task after the given anchor; returns it for
    /// immediate edit-mode entry
    pub fn create_task(&self, after: Option<&TaskId>, indent: u32) -> Task {
        let task = {
            let mut state = self.lock();
            state.store.create_task(after, indent)
        };
        self.signal.mark_changed();
        task
    }

    /// Replaces a task's title; blank titles and unknown ids are no-ops
    pub fn edit_task(&self, id: &TaskId, new_title: &str) -> bool {
        let dirty = {
            let mut state = self.lock();
            state.store.edit_task(id, new_title)
        };
        if dirty {
            self.signal.mark_changed();
        }
        dirty
    }

    /// Flips a task's completion state
    pub fn toggle_completion(&self, id: &TaskId) -> bool {
        let dirty = {
            let mut state = self.lock();
            state.store.toggle_completion(id)
        };
        if dirty {
            self.signal.mark_changed();
        }
        dirty
    }

    /// Removes a task immediately; never-synced temp tasks produce no
    /// network traffic at all
    pub fn delete_task(&self, id: &TaskId) -> bool {
        let dirty = {
            let mut state = self.lock();
            state.store.delete_task(id)
        };
        if dirty {
            self.signal.mark_changed();
        }
        dirty
    }

    /// Sets the display ordering (presentation only; no sync scheduled)
    pub fn set_sort_mode(&self, mode: SortMode) {
        self.lock().store.set_sort_mode(mode);
    }

    /// The task list in the active display ordering
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<Task> {
        self.lock().store.visible_tasks()
    }

    /// The canonical custom-order task list
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().store.tasks().to_vec()
    }

    /// Snapshot of the observable sync state
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        let state = self.lock();
        SyncStatus {
            has_pending: state.store.has_pending_changes(),
            in_flight: state.in_flight,
            last_error: state.last_error.clone(),
            auth_suspended: state.auth_suspended,
        }
    }

    /// One flush cycle: snapshot, send, reconcile
    async fn flush_once(&self) -> FlushOutcome {
        let request = {
            let mut state = self.lock();
            if state.auth_suspended {
                return FlushOutcome::NothingToSend;
            }
            let request = SyncDeltaRequest::from_queue(&self.session_page_id, state.store.queue());
            if request.is_empty() {
                return FlushOutcome::NothingToSend;
            }
            state.in_flight = true;
            request
        };

        debug!(
            creates = request.creates.len(),
            updates = request.updates.len(),
            deletes = request.deletes.len(),
            "Flushing delta batch"
        );

        let result = self.remote.sync_delta(&request).await;

        match result {
            Ok(response) => {
                let abandoned: Vec<FailedDelta> = {
                    let mut state = self.lock();
                    state.in_flight = false;
                    state.last_error = None;
                    let outcome = reconcile::apply_response(
                        &mut state.store,
                        &request,
                        &response,
                        self.attempt_limit,
                    );
                    info!(
                        created = outcome.confirmed_creates.len(),
                        updated = outcome.confirmed_updates.len(),
                        deleted = outcome.confirmed_deletes.len(),
                        retrying = outcome.retrying.len(),
                        abandoned = outcome.abandoned.len(),
                        "Sync response reconciled"
                    );
                    outcome.abandoned
                };
                // Observer calls happen outside the lock; they are
                // fire-and-forget and must not extend the critical section
                for delta in &abandoned {
                    self.observer.delta_abandoned(delta);
                }
                FlushOutcome::Synced
            }
            Err(RemoteSyncError::AuthExpired) => {
                {
                    let mut state = self.lock();
                    state.in_flight = false;
                    state.auth_suspended = true;
                    state.last_error = Some(RemoteSyncError::AuthExpired.to_string());
                }
                self.observer.reauth_required();
                FlushOutcome::AuthExpired
            }
            Err(err) => {
                warn!(error = %err, "Delta batch failed, queue preserved for retry");
                {
                    let mut state = self.lock();
                    state.in_flight = false;
                    state.last_error = Some(err.to_string());
                }
                self.observer.sync_failed(&err.to_string());
                FlushOutcome::Failed
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // Mutation sections cannot panic mid-update in normal operation;
        // recover the guard rather than poisoning the whole session
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl FlushTarget for SyncEngine {
    async fn flush(&self) -> FlushOutcome {
        self.flush_once().await
    }
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use gardensync_core::wire::{CreatedEntry, SyncDeltaResponse};
    use tracing_subscriber::EnvFilter;

    use super::*;

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn session() -> SessionPageId {
        "page-1".parse().unwrap()
    }

    /// Remote fake that confirms everything, allocating sequential ids,
    /// unless a scripted error is queued
    struct FakeRemote {
        requests: Mutex<Vec<SyncDeltaRequest>>,
        errors: Mutex<VecDeque<RemoteSyncError>>,
        next_id: AtomicUsize,
    }

    impl FakeRemote {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                errors: Mutex::new(VecDeque::new()),
                next_id: AtomicUsize::new(1),
            })
        }

        fn push_error(&self, err: RemoteSyncError) {
            self.errors.lock().unwrap().push_back(err);
        }

        fn requests(&self) -> Vec<SyncDeltaRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RemoteSyncPort for FakeRemote {
        async fn sync_delta(
            &self,
            request: &SyncDeltaRequest,
        ) -> Result<SyncDeltaResponse, RemoteSyncError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(err) = self.errors.lock().unwrap().pop_front() {
                return Err(err);
            }
            Ok(SyncDeltaResponse {
                created: request
                    .creates
                    .iter()
                    .map(|c| CreatedEntry {
                        client_temp_id: c.client_temp_id.clone(),
                        id: format!("blk_{}", self.next_id.fetch_add(1, Ordering::SeqCst))
                            .parse()
                            .unwrap(),
                    })
                    .collect(),
                updated: request.updates.iter().map(|u| u.id.clone()).collect(),
                deleted: request.deletes.clone(),
                failed: Default::default(),
            })
        }
    }

    /// Observer fake recording every callback
    #[derive(Default)]
    struct RecordingObserver {
        failures: Mutex<Vec<String>>,
        abandoned: Mutex<Vec<FailedDelta>>,
        reauth: AtomicBool,
    }

    impl SyncObserverPort for RecordingObserver {
        fn sync_failed(&self, message: &str) {
            self.failures.lock().unwrap().push(message.to_string());
        }
        fn delta_abandoned(&self, delta: &FailedDelta) {
            self.abandoned.lock().unwrap().push(delta.clone());
        }
        fn reauth_required(&self) {
            self.reauth.store(true, Ordering::SeqCst);
        }
    }

    struct FakeReader {
        tasks: Vec<Task>,
    }

    #[async_trait::async_trait]
    impl TaskReaderPort for FakeReader {
        async fn load_tasks(&self, _session: &SessionPageId) -> anyhow::Result<Vec<Task>> {
            Ok(self.tasks.clone())
        }
    }

    fn engine_with(
        remote: Arc<FakeRemote>,
        observer: Arc<RecordingObserver>,
    ) -> (Arc<SyncEngine>, SyncScheduler) {
        SyncEngine::new(session(), remote, observer, &SyncConfig::default())
    }

    #[tokio::test]
    async fn test_flush_with_empty_queue_sends_nothing() {
        init_logging();
        let remote = FakeRemote::new();
        let (engine, _scheduler) = engine_with(remote.clone(), Arc::default());

        assert_eq!(engine.flush_once().await, FlushOutcome::NothingToSend);
        assert!(remote.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_edit_flush_reconciles_id() {
        init_logging();
        let remote = FakeRemote::new();
        let (engine, _scheduler) = engine_with(remote.clone(), Arc::default());

        let task = engine.create_task(None, 0);
        engine.edit_task(&task.id, "water the ferns");
        assert!(engine.status().has_pending);

        assert_eq!(engine.flush_once().await, FlushOutcome::Synced);

        // One create on the wire, no separate update for the temp edit
        let requests = remote.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].creates.len(), 1);
        assert_eq!(requests[0].creates[0].title, "water the ferns");
        assert!(requests[0].updates.is_empty());

        // Temp id retired, server id live, queue drained
        let status = engine.status();
        assert!(!status.has_pending);
        assert_eq!(status.last_error, None);
        let tasks = engine.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id.as_str(), "blk_1");
        assert!(!engine.edit_task(&task.id, "stale temp id"));
        assert!(engine.edit_task(&tasks[0].id, "fresh id works"));
    }

    #[tokio::test]
    async fn test_failed_flush_preserves_queue_exactly() {
        init_logging();
        let remote = FakeRemote::new();
        let observer: Arc<RecordingObserver> = Arc::default();
        let (engine, _scheduler) = engine_with(remote.clone(), observer.clone());
        remote.push_error(RemoteSyncError::Transport("connection reset".into()));

        let task = engine.create_task(None, 0);
        engine.edit_task(&task.id, "fragile");
        let queue_before = engine.lock().store.queue().clone();

        assert_eq!(engine.flush_once().await, FlushOutcome::Failed);

        assert_eq!(engine.lock().store.queue(), &queue_before);
        let status = engine.status();
        assert!(status.has_pending);
        assert!(status.last_error.unwrap().contains("connection reset"));
        assert_eq!(observer.failures.lock().unwrap().len(), 1);

        // Retry of the identical batch succeeds
        assert_eq!(engine.flush_once().await, FlushOutcome::Synced);
        assert!(!engine.status().has_pending);
        assert_eq!(remote.requests().len(), 2);
        assert_eq!(remote.requests()[0], remote.requests()[1]);
    }

    #[tokio::test]
    async fn test_auth_expiry_suspends_sync() {
        init_logging();
        let remote = FakeRemote::new();
        let observer: Arc<RecordingObserver> = Arc::default();
        let (engine, _scheduler) = engine_with(remote.clone(), observer.clone());
        remote.push_error(RemoteSyncError::AuthExpired);

        engine.create_task(None, 0);
        assert_eq!(engine.flush_once().await, FlushOutcome::AuthExpired);
        assert!(observer.reauth.load(Ordering::SeqCst));
        assert!(engine.status().auth_suspended);

        // Suspended: no further batch leaves the engine
        assert_eq!(engine.flush_once().await, FlushOutcome::NothingToSend);
        assert_eq!(remote.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_temp_create_then_delete_never_flushes() {
        init_logging();
        let remote = FakeRemote::new();
        let (engine, _scheduler) = engine_with(remote.clone(), Arc::default());

        let task = engine.create_task(None, 0);
        engine.delete_task(&task.id);

        assert_eq!(engine.flush_once().await, FlushOutcome::NothingToSend);
        assert!(remote.requests().is_empty());
    }

    #[tokio::test]
    async fn test_load_session_seeds_store() {
        init_logging();
        let remote = FakeRemote::new();
        let (engine, _scheduler) = engine_with(remote, Arc::default());
        let reader = FakeReader {
            tasks: vec![Task {
                id: "blk_7".parse().unwrap(),
                title: "prune the ivy".to_string(),
                completed: false,
                indent: 0,
            }],
        };

        let count = engine.load_session(&reader).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(engine.tasks()[0].title, "prune the ivy");

        // A pending local edit blocks a destructive reload
        engine.edit_task(&"blk_7".parse().unwrap(), "prune the ivy today");
        assert!(engine.load_session(&reader).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_drives_one_flush_for_burst() {
        init_logging();
        let remote = FakeRemote::new();
        let observer: Arc<RecordingObserver> = Arc::default();
        let (engine, scheduler) = engine_with(remote.clone(), observer);
        let handle = tokio::spawn(scheduler.run(engine.clone()));

        let task = engine.create_task(None, 0);
        engine.edit_task(&task.id, "s");
        engine.edit_task(&task.id, "se");
        engine.edit_task(&task.id, "see");
        engine.edit_task(&task.id, "seed");

        // Default debounce is 2s; one quiet period, one request
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        let requests = remote.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].creates[0].title, "seed");
        assert!(!engine.status().has_pending);

        // The scheduler task holds the engine alive; stop it directly
        handle.abort();
        let _ = handle.await;
    }
}
