//! Mutation queue.
//!
//! The ordered list of pending changes. Every mutating call re-persists the
//! whole list through a [`QueueStore`] before returning, so the durable copy
//! never lags the in-memory one.

use crate::error::EngineResult;
use crate::persist::QueueStore;
use offsync_protocol::{ChangeId, QueuedChange};
use offsync_storage::KeyValueStore;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// An ordered, persisted sequence of [`QueuedChange`]s.
///
/// # Invariants
///
/// - Insertion order is replay order; no operation reorders entries
/// - The write lock is held across the durable save, so saves land in
///   the same order as the in-memory mutations they mirror
/// - When a save fails the in-memory list keeps the change and the error
///   is returned; the next successful save catches the store up
/// - If the store could not be read at open, nothing is saved until a
///   later read succeeds; the durable changes then come first, followed
///   by whatever was queued in memory meanwhile
pub struct MutationQueue<S: KeyValueStore> {
    changes: RwLock<Vec<QueuedChange>>,
    store: QueueStore<S>,
    loaded: AtomicBool,
}

impl<S: KeyValueStore> MutationQueue<S> {
    /// Opens the queue, loading whatever the store holds.
    ///
    /// A store that cannot be read leaves the queue empty and unloaded; see
    /// [`is_loaded`](Self::is_loaded).
    pub fn load(store: QueueStore<S>) -> Self {
        let (changes, loaded) = match store.load() {
            Ok(changes) => (changes, true),
            Err(_) => (Vec::new(), false),
        };
        if !changes.is_empty() {
            tracing::info!(
                key = store.key(),
                pending = changes.len(),
                "restored offline queue"
            );
        }

        Self {
            changes: RwLock::new(changes),
            store,
            loaded: AtomicBool::new(loaded),
        }
    }

    /// Returns false while the durable record has not been read.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Saves `changes`, first merging in the durable record if it has not
    /// been read yet. Must be called with the write lock held.
    fn persist(&self, changes: &mut Vec<QueuedChange>) -> EngineResult<()> {
        if !self.is_loaded() {
            let mut merged = self.store.load()?;
            let known: HashSet<ChangeId> = merged.iter().map(|c| c.id).collect();
            merged.extend(changes.drain(..).filter(|c| !known.contains(&c.id)));
            *changes = merged;
            self.loaded.store(true, Ordering::Release);
            tracing::info!(
                key = self.store.key(),
                pending = changes.len(),
                "recovered offline queue"
            );
        }
        self.store.save(changes)
    }

    /// Returns the durable store backing this queue.
    pub fn store(&self) -> &QueueStore<S> {
        &self.store
    }

    /// Appends a change and persists the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue could not be persisted. The change is
    /// queued in memory either way.
    pub fn enqueue(&self, change: QueuedChange) -> EngineResult<ChangeId> {
        let id = change.id;
        let mut changes = self.changes.write();
        changes.push(change);
        self.persist(&mut changes)?;
        Ok(id)
    }

    /// Appends several changes in order and persists the queue.
    ///
    /// Unlike [`enqueue`](Self::enqueue) this is all or nothing: when the
    /// save fails the changes are taken back out of the in-memory list.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue could not be persisted.
    pub fn extend(&self, new_changes: Vec<QueuedChange>) -> EngineResult<()> {
        if new_changes.is_empty() {
            return Ok(());
        }
        let added: HashSet<ChangeId> = new_changes.iter().map(|c| c.id).collect();
        let mut changes = self.changes.write();
        changes.extend(new_changes);
        let result = self.persist(&mut changes);
        if result.is_err() {
            changes.retain(|c| !added.contains(&c.id));
        }
        result
    }

    /// Returns an ordered copy of the queue.
    pub fn snapshot(&self) -> Vec<QueuedChange> {
        self.changes.read().clone()
    }

    /// Returns the number of pending changes.
    pub fn len(&self) -> usize {
        self.changes.read().len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.changes.read().is_empty()
    }

    /// Atomically replaces the whole queue and persists it.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue could not be persisted.
    pub fn replace_with(&self, new_changes: Vec<QueuedChange>) -> EngineResult<()> {
        let mut changes = self.changes.write();
        *changes = new_changes;
        self.persist(&mut changes)
    }

    /// Settles the queue after a flush of `snapshot_ids`.
    ///
    /// The new queue is `retained` followed by every change enqueued after
    /// the snapshot was taken, each group in its original order. Retained
    /// changes that were removed from the queue while the flush ran (for
    /// example by [`clear`](Self::clear)) stay removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue could not be persisted.
    pub fn complete_flush(
        &self,
        snapshot_ids: &HashSet<ChangeId>,
        retained: Vec<QueuedChange>,
    ) -> EngineResult<()> {
        self.complete_flush_with(snapshot_ids, retained, Vec::new(), |_| Ok(()))
    }

    /// Like [`complete_flush`](Self::complete_flush), also dropping
    /// `abandoned` changes from the queue.
    ///
    /// `abandon` receives the abandoned changes that are still queued and
    /// runs under the queue's write lock, before the queue is saved.
    /// Changes removed while the flush ran are never passed to it. If
    /// `abandon` fails, the changes stay queued in their original position.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue could not be persisted, or else the
    /// error from `abandon`.
    pub fn complete_flush_with<F>(
        &self,
        snapshot_ids: &HashSet<ChangeId>,
        mut retained: Vec<QueuedChange>,
        mut abandoned: Vec<QueuedChange>,
        abandon: F,
    ) -> EngineResult<()>
    where
        F: FnOnce(Vec<QueuedChange>) -> EngineResult<()>,
    {
        let mut changes = self.changes.write();

        let live: HashSet<ChangeId> = changes.iter().map(|c| c.id).collect();
        retained.retain(|c| live.contains(&c.id));
        abandoned.retain(|c| live.contains(&c.id));

        let mut abandon_result = Ok(());
        if !abandoned.is_empty() {
            abandon_result = abandon(abandoned.clone());
            if abandon_result.is_err() {
                let position: HashMap<ChangeId, usize> =
                    changes.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
                retained.extend(abandoned);
                retained.sort_by_key(|c| position.get(&c.id).copied());
            }
        }

        retained.extend(
            changes
                .iter()
                .filter(|c| !snapshot_ids.contains(&c.id))
                .cloned(),
        );

        *changes = retained;
        if let Err(e) = self.persist(&mut changes) {
            if let Err(abandon_err) = abandon_result {
                tracing::error!(
                    key = self.store.key(),
                    error = %abandon_err,
                    "failed to hand over abandoned changes"
                );
            }
            return Err(e);
        }
        abandon_result
    }

    /// Empties the queue and removes its durable record, read or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable record could not be removed.
    pub fn clear(&self) -> EngineResult<()> {
        let mut changes = self.changes.write();
        changes.clear();
        self.store.clear()?;
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }
}
