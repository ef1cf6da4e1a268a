//! Offline engine and sync driver state machine.

use crate::config::EngineConfig;
use crate::connectivity::{ConnectivityEdge, ConnectivityMonitor, ConnectivityProbe};
use crate::error::{EngineError, EngineResult};
use crate::notifier::{Notifier, Severity};
use crate::persist::QueueStore;
use crate::queue::MutationQueue;
use crate::remote::RemoteStore;
use offsync_protocol::{ChangeId, Mutation, QueuedChange};
use offsync_storage::KeyValueStore;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// The driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No flush in flight.
    Idle,
    /// A flush is in flight.
    Syncing,
}

impl DriverState {
    /// Returns true if a flush is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, DriverState::Syncing)
    }
}

/// Statistics about flushes.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Total number of flush passes completed.
    pub flushes_completed: u64,
    /// Total number of changes the remote store acknowledged.
    pub changes_applied: u64,
    /// Total number of rejected dispatches.
    pub changes_failed: u64,
    /// Total number of changes moved to the dead-letter list.
    pub changes_dead_lettered: u64,
    /// End of the last flush pass.
    pub last_flush_time: Option<Instant>,
    /// Last local persistence error.
    pub last_error: Option<String>,
}

/// Result of one flush pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    /// Changes in the snapshot.
    pub snapshot: usize,
    /// Changes dispatched to the remote store.
    pub attempted: usize,
    /// Changes the remote store acknowledged.
    pub applied: usize,
    /// Changes rejected and retained.
    pub failed: usize,
    /// Changes not dispatched because connectivity dropped.
    pub deferred: usize,
    /// Changes rejected and moved to the dead-letter list.
    pub dead_lettered: usize,
    /// Wall time of the pass.
    pub duration: Duration,
}

impl FlushOutcome {
    /// Returns the number of changes still queued because of this pass.
    pub fn retained(&self) -> usize {
        self.failed + self.deferred
    }

    /// Returns true if every change in the snapshot was applied.
    pub fn is_complete(&self) -> bool {
        self.applied == self.snapshot
    }

    /// Returns the one user-facing summary of this pass.
    fn summary(&self) -> Option<(String, Severity)> {
        if self.failed == 0 && self.dead_lettered == 0 && self.deferred == 0 {
            if self.applied == 0 {
                return None;
            }
            let message = format!("All {} synced", changes(self.applied));
            return Some((message, Severity::Success));
        }

        // Only the first part spells out "change(s)"
        let parts: Vec<String> = [
            (self.failed, "failed to sync"),
            (self.dead_lettered, "abandoned after repeated failures"),
            (self.deferred, "waiting to sync"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .enumerate()
        .map(|(i, (n, what))| {
            if i == 0 {
                format!("{} {what}", changes(n))
            } else {
                format!("{n} {what}")
            }
        })
        .collect();
        let message = parts.join("; ");

        let severity = if self.failed > 0 || self.dead_lettered > 0 {
            Severity::Error
        } else {
            Severity::Warning
        };
        Some((message, severity))
    }
}

fn changes(n: usize) -> String {
    if n == 1 {
        "1 change".to_string()
    } else {
        format!("{n} changes")
    }
}

#[derive(Debug)]
struct Flight {
    state: DriverState,
    rerun: bool,
}

/// The offline engine owns the queue and replays it into a remote store.
///
/// # Lifecycle
///
/// Create one engine per queue with [`open`](Self::open) at process start
/// and share it with `Arc`. Call [`shutdown`](Self::shutdown) before exit
/// for a final flush attempt. Nothing is global.
///
/// # Flushing
///
/// [`maybe_sync`](Self::maybe_sync) is the single entry point. It runs on
/// enqueue while online, on every reconnect edge, and on explicit request.
/// At most one flush is in flight; triggers that arrive during a flush are
/// coalesced into exactly one follow-up pass.
pub struct OfflineEngine<R: RemoteStore, S: KeyValueStore, N: Notifier> {
    config: EngineConfig,
    remote: Arc<R>,
    notifier: Arc<N>,
    queue: MutationQueue<Arc<S>>,
    dead_letters: MutationQueue<Arc<S>>,
    connectivity: ConnectivityMonitor,
    flight: Mutex<Flight>,
    stats: RwLock<EngineStats>,
}

impl<R: RemoteStore, S: KeyValueStore, N: Notifier> OfflineEngine<R, S, N> {
    /// Opens an engine, restoring any queue persisted under the configured
    /// key and reading the initial connectivity from `probe`.
    pub fn open<P: ConnectivityProbe + ?Sized>(
        config: EngineConfig,
        remote: R,
        store: S,
        probe: &P,
        notifier: N,
    ) -> Self {
        let store = Arc::new(store);
        let queue = MutationQueue::load(QueueStore::new(Arc::clone(&store), config.queue_key()));
        let dead_letters =
            MutationQueue::load(QueueStore::new(Arc::clone(&store), config.dead_letter_key()));
        for list in [&queue, &dead_letters] {
            if !list.is_loaded() {
                warn!(
                    key = list.store().key(),
                    "stored queue unreadable; saves wait until it can be read"
                );
            }
        }
        let connectivity = ConnectivityMonitor::new(probe);

        info!(
            key = %config.queue_key(),
            pending = queue.len(),
            dead_letters = dead_letters.len(),
            online = connectivity.is_online(),
            "offline engine opened"
        );

        Self {
            config,
            remote: Arc::new(remote),
            notifier: Arc::new(notifier),
            queue,
            dead_letters,
            connectivity,
            flight: Mutex::new(Flight {
                state: DriverState::Idle,
                rerun: false,
            }),
            stats: RwLock::new(EngineStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the remote store.
    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Returns the notifier.
    pub fn notifier(&self) -> &Arc<N> {
        &self.notifier
    }

    /// Gets the current driver state.
    pub fn state(&self) -> DriverState {
        self.flight.lock().state
    }

    /// Gets the current stats.
    pub fn stats(&self) -> EngineStats {
        self.stats.read().clone()
    }

    /// Returns true if the connectivity monitor reports online.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Returns the number of pending changes.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Returns the pending changes in replay order.
    pub fn pending(&self) -> Vec<QueuedChange> {
        self.queue.snapshot()
    }

    /// Returns the abandoned changes in the order they were abandoned.
    pub fn dead_letters(&self) -> Vec<QueuedChange> {
        self.dead_letters.snapshot()
    }

    /// Queues a mutation and, when online, starts a flush.
    ///
    /// Returns as soon as the change is queued if a flush is already in
    /// flight; that flush is followed by one more pass that picks it up.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidMutation`] if the table name or a
    /// filter column is empty. Nothing else is reported to the caller:
    /// persistence failures go to the notifier.
    pub async fn enqueue(
        &self,
        table: impl Into<String>,
        mutation: Mutation,
    ) -> EngineResult<ChangeId> {
        let change = QueuedChange::new(table, mutation)?;
        let id = change.id;

        debug!(%id, table = %change.table, op = %change.operation(), "queued change");
        if let Err(e) = self.queue.enqueue(change) {
            self.report_persistence_error(&e);
        }

        if self.config.flush_on_enqueue {
            self.maybe_sync().await;
        }

        Ok(id)
    }

    /// Explicit "sync now" request.
    pub async fn sync_now(&self) -> Option<FlushOutcome> {
        self.maybe_sync().await
    }

    /// Flushes the queue if online, idle and non-empty.
    ///
    /// Returns the outcome of the last pass this call ran, or `None` if it
    /// ran nothing (offline, empty queue, or another flush in flight).
    pub async fn maybe_sync(&self) -> Option<FlushOutcome> {
        if !self.is_online() {
            debug!("offline, not flushing");
            return None;
        }

        {
            let mut flight = self.flight.lock();
            if flight.state.is_active() {
                debug!("flush in flight, scheduling follow-up");
                flight.rerun = true;
                return None;
            }
            if self.queue.is_empty() {
                return None;
            }
            flight.state = DriverState::Syncing;
        }

        let outcome = loop {
            let outcome = self.flush().await;

            let mut flight = self.flight.lock();
            if flight.rerun && self.is_online() && !self.queue.is_empty() {
                flight.rerun = false;
                debug!("running follow-up flush");
                continue;
            }
            flight.rerun = false;
            flight.state = DriverState::Idle;
            break outcome;
        };

        Some(outcome)
    }

    /// One pass over a snapshot of the queue.
    async fn flush(&self) -> FlushOutcome {
        let start = Instant::now();
        let snapshot = self.queue.snapshot();
        let snapshot_ids: HashSet<ChangeId> = snapshot.iter().map(|c| c.id).collect();

        let mut outcome = FlushOutcome {
            snapshot: snapshot.len(),
            ..FlushOutcome::default()
        };
        let mut retained = Vec::new();
        let mut abandoned = Vec::new();

        info!(pending = snapshot.len(), "flushing offline queue");

        let mut pending = snapshot.into_iter();
        while let Some(mut change) = pending.next() {
            if !self.is_online() {
                outcome.deferred = 1 + pending.len();
                info!(deferred = outcome.deferred, "went offline during flush");
                retained.push(change);
                retained.extend(pending.by_ref());
                break;
            }

            outcome.attempted += 1;
            let result = self.remote.apply(&change.table, &change.mutation).await;
            match result {
                Ok(()) => {
                    outcome.applied += 1;
                    debug!(
                        id = %change.id,
                        table = %change.table,
                        op = %change.operation(),
                        "change applied"
                    );
                }
                Err(err) => {
                    let attempts = change.record_failure();
                    warn!(
                        id = %change.id,
                        table = %change.table,
                        op = %change.operation(),
                        attempts,
                        error = %err,
                        "change rejected"
                    );

                    if self.config.retry.is_exhausted(attempts) {
                        outcome.dead_lettered += 1;
                        abandoned.push(change);
                    } else {
                        outcome.failed += 1;
                        retained.push(change);
                    }
                }
            }
        }

        // Dead letters land first: a crash in between leaves the change in
        // both lists, never in neither. Changes cleared while the flush ran
        // are not dead-lettered; ones the dead-letter list could not take
        // stay queued.
        let rejected = outcome.failed + outcome.dead_lettered;
        let mut handed = 0;
        let mut dead_lettered = 0;
        let settled = self.queue.complete_flush_with(&snapshot_ids, retained, abandoned, |live| {
            handed = live.len();
            self.dead_letters.extend(live)?;
            dead_lettered = handed;
            Ok(())
        });
        outcome.failed += handed - dead_lettered;
        outcome.dead_lettered = dead_lettered;
        if let Err(e) = settled {
            self.report_persistence_error(&e);
        }

        outcome.duration = start.elapsed();

        {
            let mut stats = self.stats.write();
            stats.flushes_completed += 1;
            stats.changes_applied += outcome.applied as u64;
            stats.changes_failed += rejected as u64;
            stats.changes_dead_lettered += outcome.dead_lettered as u64;
            stats.last_flush_time = Some(Instant::now());
        }

        info!(
            applied = outcome.applied,
            failed = outcome.failed,
            deferred = outcome.deferred,
            dead_lettered = outcome.dead_lettered,
            remaining = self.queue.len(),
            elapsed_ms = outcome.duration.as_millis() as u64,
            "flush finished"
        );

        if let Some((message, severity)) = outcome.summary() {
            self.notifier.notify(&message, severity);
        }

        outcome
    }

    /// Applies a host connectivity event.
    ///
    /// On the `Offline → Online` edge this flushes the queue and returns the
    /// outcome. Repeated events for the current level do nothing.
    pub async fn handle_connectivity(&self, online: bool) -> Option<FlushOutcome> {
        match self.connectivity.observe(online)? {
            ConnectivityEdge::WentOnline => {
                info!(pending = self.queue.len(), "connectivity restored");
                if self.config.announce_connectivity {
                    self.notifier.notify("Back online", Severity::Success);
                }
                self.maybe_sync().await
            }
            ConnectivityEdge::WentOffline => {
                info!(pending = self.queue.len(), "connectivity lost");
                if self.config.announce_connectivity {
                    self.notifier.notify(
                        "You are offline. Changes will be saved locally",
                        Severity::Warning,
                    );
                }
                None
            }
        }
    }

    /// Host event: connectivity restored.
    pub async fn went_online(&self) -> Option<FlushOutcome> {
        self.handle_connectivity(true).await
    }

    /// Host event: connectivity lost.
    pub async fn went_offline(&self) {
        self.handle_connectivity(false).await;
    }

    /// Discards every pending change.
    pub fn clear(&self) {
        info!(discarded = self.queue.len(), "clearing offline queue");
        if let Err(e) = self.queue.clear() {
            self.report_persistence_error(&e);
        }
    }

    /// Moves every dead letter back to the end of the queue with its
    /// attempt count reset, and starts a flush when online.
    ///
    /// Returns how many changes were requeued. If the queue cannot be saved
    /// nothing is requeued and the dead letters are kept.
    pub async fn requeue_dead_letters(&self) -> usize {
        let mut revived = self.dead_letters.snapshot();
        if revived.is_empty() {
            return 0;
        }
        let ids: HashSet<ChangeId> = revived.iter().map(|c| c.id).collect();
        for change in &mut revived {
            change.attempts = 0;
        }

        let count = revived.len();
        info!(count, "requeueing dead letters");
        // The dead letters are only dropped once the queue holds them
        // durably
        if let Err(e) = self.queue.extend(revived) {
            self.report_persistence_error(&e);
            return 0;
        }
        if let Err(e) = self.dead_letters.complete_flush(&ids, Vec::new()) {
            self.report_persistence_error(&e);
        }

        self.maybe_sync().await;
        count
    }

    /// Discards every dead letter.
    pub fn clear_dead_letters(&self) {
        info!(discarded = self.dead_letters.len(), "clearing dead letters");
        if let Err(e) = self.dead_letters.clear() {
            self.report_persistence_error(&e);
        }
    }

    /// Makes a final flush attempt before the process exits.
    pub async fn shutdown(&self) -> Option<FlushOutcome> {
        info!(pending = self.queue.len(), "shutting down offline engine");
        let outcome = self.maybe_sync().await;
        if !self.queue.is_empty() {
            info!(pending = self.queue.len(), "changes remain queued for next start");
        }
        outcome
    }

    /// Handles an error by logging, recording and notifying it.
    fn report_persistence_error(&self, err: &EngineError) {
        error!(error = %err, "failed to persist offline queue");
        self.stats.write().last_error = Some(err.to_string());
        self.notifier.notify(
            &format!("Could not save offline changes: {err}"),
            Severity::Error,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::connectivity::StaticProbe;
    use crate::notifier::RecordingNotifier;
    use crate::remote::MockRemote;
    use offsync_protocol::{Row, RowFilter};
    use offsync_storage::InMemoryStore;
    use serde_json::json;

    type TestEngine = OfflineEngine<MockRemote, InMemoryStore, RecordingNotifier>;

    fn engine(online: bool) -> TestEngine {
        engine_with(EngineConfig::new(), online)
    }

    fn engine_with(config: EngineConfig, online: bool) -> TestEngine {
        OfflineEngine::open(
            config,
            MockRemote::new(),
            InMemoryStore::new(),
            &StaticProbe(online),
            RecordingNotifier::new(),
        )
    }

    fn update(n: i64) -> Mutation {
        let mut data = Row::new();
        data.insert("n".into(), json!(n));
        Mutation::update(data, RowFilter::eq("id", n))
    }

    #[test]
    fn flush_outcome_summaries() {
        let ok = FlushOutcome {
            snapshot: 2,
            attempted: 2,
            applied: 2,
            ..FlushOutcome::default()
        };
        assert!(ok.is_complete());
        assert_eq!(
            ok.summary(),
            Some(("All 2 changes synced".to_string(), Severity::Success))
        );

        let partial = FlushOutcome {
            snapshot: 3,
            attempted: 3,
            applied: 2,
            failed: 1,
            ..FlushOutcome::default()
        };
        assert_eq!(partial.retained(), 1);
        assert_eq!(
            partial.summary(),
            Some(("1 change failed to sync".to_string(), Severity::Error))
        );

        let mixed = FlushOutcome {
            snapshot: 5,
            failed: 2,
            deferred: 2,
            dead_lettered: 1,
            ..FlushOutcome::default()
        };
        assert_eq!(
            mixed.summary(),
            Some((
                "2 changes failed to sync; 1 abandoned after repeated failures; 2 waiting to sync"
                    .to_string(),
                Severity::Error
            ))
        );

        let abandoned = FlushOutcome {
            snapshot: 1,
            attempted: 1,
            dead_lettered: 1,
            ..FlushOutcome::default()
        };
        assert_eq!(
            abandoned.summary().unwrap().0,
            "1 change abandoned after repeated failures"
        );

        assert!(FlushOutcome::default().summary().is_none());
    }

    #[test]
    fn deferred_only_summary_is_a_warning() {
        let deferred = FlushOutcome {
            snapshot: 3,
            attempted: 1,
            applied: 1,
            deferred: 2,
            ..FlushOutcome::default()
        };
        assert_eq!(
            deferred.summary(),
            Some(("2 changes waiting to sync".to_string(), Severity::Warning))
        );

        let settled_elsewhere = FlushOutcome {
            snapshot: 1,
            attempted: 1,
            ..FlushOutcome::default()
        };
        assert!(settled_elsewhere.summary().is_none());
    }

    #[tokio::test]
    async fn engine_initial_state() {
        let engine = engine(true);
        assert_eq!(engine.state(), DriverState::Idle);
        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.stats().flushes_completed, 0);
        assert!(engine.is_online());
    }

    #[tokio::test]
    async fn enqueue_while_online_flushes() {
        let engine = engine(true);
        engine.enqueue("notes", update(1)).await.unwrap();

        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.remote().call_count(), 1);
        assert_eq!(engine.state(), DriverState::Idle);
        assert_eq!(engine.stats().changes_applied, 1);
        assert_eq!(engine.notifier().count(Severity::Success), 1);
    }

    #[tokio::test]
    async fn enqueue_while_offline_only_queues() {
        let engine = engine(false);
        engine.enqueue("notes", update(1)).await.unwrap();
        engine.enqueue("notes", update(2)).await.unwrap();

        assert_eq!(engine.pending_count(), 2);
        assert_eq!(engine.remote().call_count(), 0);
        assert!(engine.notifier().is_empty());
    }

    #[tokio::test]
    async fn enqueue_rejects_invalid_mutation() {
        let engine = engine(true);
        let err = engine
            .enqueue("", Mutation::insert(Row::new()))
            .await
            .unwrap_err();
        assert!(err.is_precondition());

        let err = engine
            .enqueue("notes", Mutation::delete(RowFilter::eq("", 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidMutation(_)));
        assert_eq!(engine.pending_count(), 0);
    }

    #[tokio::test]
    async fn flush_on_enqueue_can_be_disabled() {
        let engine = engine_with(EngineConfig::new().with_flush_on_enqueue(false), true);
        engine.enqueue("notes", update(1)).await.unwrap();
        assert_eq!(engine.pending_count(), 1);

        let outcome = engine.sync_now().await.unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(engine.pending_count(), 0);
    }

    #[tokio::test]
    async fn empty_queue_sync_is_noop() {
        let engine = engine(true);
        assert!(engine.maybe_sync().await.is_none());
        assert_eq!(engine.remote().call_count(), 0);
        assert!(engine.notifier().is_empty());
        assert_eq!(engine.stats().flushes_completed, 0);
    }

    #[tokio::test]
    async fn offline_sync_is_noop() {
        let engine = engine(false);
        engine.enqueue("notes", update(1)).await.unwrap();
        assert!(engine.sync_now().await.is_none());
        assert_eq!(engine.remote().call_count(), 0);
    }

    #[tokio::test]
    async fn partial_failure_retains_failed_in_order() {
        let engine = engine(false);
        for n in 1..=5 {
            engine.enqueue("notes", update(n)).await.unwrap();
        }
        let ids: Vec<_> = engine.pending().iter().map(|c| c.id).collect();

        engine.remote().fail_when(|_, m| {
            matches!(m.filter().map(|f| &f.value), Some(v) if *v == json!(2) || *v == json!(4))
        });

        let outcome = engine.went_online().await.unwrap();
        assert_eq!(outcome.applied, 3);
        assert_eq!(outcome.failed, 2);

        let pending = engine.pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, ids[1]);
        assert_eq!(pending[1].id, ids[3]);
        assert!(pending.iter().all(|c| c.attempts == 1));

        let notes = engine.notifier().notifications();
        assert_eq!(notes.last().unwrap().message, "2 changes failed to sync");
        assert_eq!(notes.last().unwrap().severity, Severity::Error);
    }

    #[tokio::test]
    async fn failed_changes_retry_on_next_trigger() {
        let engine = engine(true);
        engine.remote().fail_all();
        engine.enqueue("notes", update(1)).await.unwrap();
        assert_eq!(engine.pending_count(), 1);

        engine.remote().accept_all();
        let outcome = engine.sync_now().await.unwrap();
        assert!(outcome.is_complete());
        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.remote().call_count(), 2);
    }

    #[tokio::test]
    async fn retry_ceiling_moves_to_dead_letters() {
        let config = EngineConfig::new().with_retry(RetryPolicy::max_attempts(2));
        let engine = engine_with(config, true);
        engine.remote().fail_table("tags");

        engine.enqueue("tags", update(1)).await.unwrap();
        assert_eq!(engine.pending_count(), 1);
        assert!(engine.dead_letters().is_empty());

        let outcome = engine.sync_now().await.unwrap();
        assert_eq!(outcome.dead_lettered, 1);
        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.dead_letters().len(), 1);
        assert_eq!(engine.dead_letters()[0].attempts, 2);
        assert_eq!(engine.stats().changes_dead_lettered, 1);

        // Dead letters are never dispatched
        assert!(engine.sync_now().await.is_none());
        assert_eq!(engine.remote().call_count(), 2);

        engine.remote().accept_all();
        assert_eq!(engine.requeue_dead_letters().await, 1);
        assert!(engine.dead_letters().is_empty());
        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.remote().call_count(), 3);
    }

    #[tokio::test]
    async fn clear_dead_letters_discards() {
        let config = EngineConfig::new().with_retry(RetryPolicy::max_attempts(1));
        let engine = engine_with(config, true);
        engine.remote().fail_all();
        engine.enqueue("notes", update(1)).await.unwrap();
        assert_eq!(engine.dead_letters().len(), 1);

        engine.clear_dead_letters();
        assert!(engine.dead_letters().is_empty());
        assert_eq!(engine.requeue_dead_letters().await, 0);
    }

    #[tokio::test]
    async fn connectivity_edges_notify_once() {
        let engine = engine(true);

        engine.went_offline().await;
        engine.went_offline().await;
        assert!(!engine.is_online());
        assert_eq!(engine.notifier().count(Severity::Warning), 1);

        assert!(engine.went_online().await.is_none());
        assert!(engine.went_online().await.is_none());
        assert_eq!(engine.notifier().count(Severity::Success), 1);
    }

    #[tokio::test]
    async fn connectivity_announcements_can_be_disabled() {
        let engine = engine_with(EngineConfig::new().with_announce_connectivity(false), true);
        engine.went_offline().await;
        engine.went_online().await;
        assert!(engine.notifier().is_empty());
    }

    #[tokio::test]
    async fn clear_discards_pending() {
        let engine = engine(false);
        engine.enqueue("notes", update(1)).await.unwrap();
        engine.clear();
        assert_eq!(engine.pending_count(), 0);
        assert!(engine.went_online().await.is_none());
        assert_eq!(engine.remote().call_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_flushes_when_online() {
        let engine = engine_with(EngineConfig::new().with_flush_on_enqueue(false), true);
        engine.enqueue("notes", update(1)).await.unwrap();

        let outcome = engine.shutdown().await.unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(engine.pending_count(), 0);
    }
}
