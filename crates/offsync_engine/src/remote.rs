//! Remote store contract.

use offsync_protocol::{Mutation, RemoteError};
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// The remote data store the queue replays into.
///
/// One call applies one change. Implementations own their timeouts: the
/// returned future must eventually resolve so the driver can go idle.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (REST, RPC, mock for testing, etc.).
pub trait RemoteStore: Send + Sync {
    /// Applies `mutation` to `table`.
    ///
    /// Insert sends `data` as a new row, update sends `data` as a patch
    /// constrained by the filter, delete removes rows matching the filter.
    fn apply(
        &self,
        table: &str,
        mutation: &Mutation,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

impl<R: RemoteStore> RemoteStore for Arc<R> {
    fn apply(
        &self,
        table: &str,
        mutation: &Mutation,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).apply(table, mutation)
    }
}

/// One call received by [`MockRemote`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    /// Target table.
    pub table: String,
    /// The mutation sent.
    pub mutation: Mutation,
}

type FailPredicate = Box<dyn Fn(&str, &Mutation) -> bool + Send + Sync>;

/// A mock remote store for testing.
///
/// Records every call, rejects calls matching a predicate, and can be
/// gated so calls stay in flight until [`release`](Self::release) is called.
#[derive(Default)]
pub struct MockRemote {
    calls: Mutex<Vec<RemoteCall>>,
    fail_when: RwLock<Option<FailPredicate>>,
    gate: Option<Semaphore>,
    entered: Notify,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockRemote {
    /// Creates a mock that accepts everything immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock whose calls wait for [`release`](Self::release).
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    /// Rejects calls for which `predicate` returns true.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&str, &Mutation) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.write() = Some(Box::new(predicate));
    }

    /// Rejects every call to `table`.
    pub fn fail_table(&self, table: impl Into<String>) {
        let table = table.into();
        self.fail_when(move |t, _| t == table);
    }

    /// Rejects every call.
    pub fn fail_all(&self) {
        self.fail_when(|_, _| true);
    }

    /// Accepts every call from now on.
    pub fn accept_all(&self) {
        *self.fail_when.write() = None;
    }

    /// Lets `calls` gated calls complete.
    pub fn release(&self, calls: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(calls);
        }
    }

    /// Waits until a call has started since the last wait.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Returns every call received, in arrival order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the highest number of calls that were in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn should_fail(&self, table: &str, mutation: &Mutation) -> bool {
        self.fail_when
            .read()
            .as_ref()
            .is_some_and(|predicate| predicate(table, mutation))
    }
}

impl RemoteStore for MockRemote {
    async fn apply(&self, table: &str, mutation: &Mutation) -> Result<(), RemoteError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        self.calls.lock().push(RemoteCall {
            table: table.to_string(),
            mutation: mutation.clone(),
        });
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let failed = self.should_fail(table, mutation);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if failed {
            Err(RemoteError::with_kind(
                format!("{} on {table} rejected", mutation.kind()),
                "rejected",
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offsync_protocol::{Row, RowFilter};

    #[tokio::test]
    async fn mock_remote_records_calls() {
        let remote = MockRemote::new();
        remote
            .apply("notes", &Mutation::insert(Row::new()))
            .await
            .unwrap();
        remote
            .apply("tags", &Mutation::delete(RowFilter::eq("id", 1)))
            .await
            .unwrap();

        let calls = remote.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].table, "notes");
        assert_eq!(calls[1].mutation, Mutation::delete(RowFilter::eq("id", 1)));
        assert_eq!(remote.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn mock_remote_failures() {
        let remote = MockRemote::new();
        remote.fail_table("tags");

        assert!(remote.apply("notes", &Mutation::insert(Row::new())).await.is_ok());
        let err = remote
            .apply("tags", &Mutation::insert(Row::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind.as_deref(), Some("rejected"));

        remote.accept_all();
        assert!(remote.apply("tags", &Mutation::insert(Row::new())).await.is_ok());

        remote.fail_all();
        assert!(remote.apply("notes", &Mutation::insert(Row::new())).await.is_err());
    }

    #[tokio::test]
    async fn gated_remote_holds_calls() {
        let remote = Arc::new(MockRemote::gated());

        let task = {
            let remote = Arc::clone(&remote);
            tokio::spawn(async move {
                let mutation = Mutation::insert(Row::new());
                let result = remote.apply("notes", &mutation).await;
                result
            })
        };

        remote.wait_entered().await;
        assert_eq!(remote.call_count(), 1);
        assert!(!task.is_finished());

        remote.release(1);
        assert!(task.await.unwrap().is_ok());
    }
}
