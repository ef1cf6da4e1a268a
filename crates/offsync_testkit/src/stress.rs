//! Stress helpers for the offline engine.
//!
//! These drive many concurrent producers against one engine to check that
//! nothing is lost and at most one flush is ever in flight.

use offsync_engine::{ChangeId, Mutation, Notifier, OfflineEngine, RemoteStore, RowFilter};
use offsync_storage::KeyValueStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total enqueue calls made.
    pub total_ops: usize,
    /// Enqueue calls that returned an id.
    pub successful_ops: usize,
    /// Enqueue calls that returned an error.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Ids returned, per producer, in the order each producer enqueued.
    pub ids_by_producer: Vec<Vec<ChangeId>>,
}

impl StressTestResult {
    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent producer tasks.
    pub producers: usize,
    /// Changes enqueued by each producer.
    pub per_producer: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            producers: 4,
            per_producer: 25,
        }
    }
}

/// The mutation producer `p` enqueues as its `i`th change. The filter value
/// encodes both so ordering can be checked from the remote's call log.
pub fn producer_mutation(producer: usize, index: usize) -> Mutation {
    Mutation::delete(RowFilter::eq("id", (producer * 1_000_000 + index) as i64))
}

/// Splits a value produced by [`producer_mutation`] back into
/// `(producer, index)`.
pub fn decode_producer_value(value: i64) -> (usize, usize) {
    let value = value as usize;
    (value / 1_000_000, value % 1_000_000)
}

/// Runs `config.producers` tasks that each enqueue `config.per_producer`
/// changes on `engine` concurrently.
pub async fn concurrent_enqueue<R, S, N>(
    engine: Arc<OfflineEngine<R, S, N>>,
    config: &StressConfig,
) -> StressTestResult
where
    R: RemoteStore + 'static,
    S: KeyValueStore + 'static,
    N: Notifier + 'static,
{
    let start = Instant::now();
    let mut handles = Vec::with_capacity(config.producers);

    for producer in 0..config.producers {
        let engine = Arc::clone(&engine);
        let per_producer = config.per_producer;
        handles.push(tokio::spawn(async move {
            let mut ids = Vec::with_capacity(per_producer);
            let mut failed = 0usize;
            for index in 0..per_producer {
                match engine
                    .enqueue("stress", producer_mutation(producer, index))
                    .await
                {
                    Ok(id) => ids.push(id),
                    Err(_) => failed += 1,
                }
                tokio::task::yield_now().await;
            }
            (ids, failed)
        }));
    }

    let mut ids_by_producer = Vec::with_capacity(config.producers);
    let mut failed_ops = 0;
    for handle in handles {
        let (ids, failed) = handle.await.expect("producer task panicked");
        failed_ops += failed;
        ids_by_producer.push(ids);
    }

    let successful_ops = ids_by_producer.iter().map(Vec::len).sum();
    StressTestResult {
        total_ops: successful_ops + failed_ops,
        successful_ops,
        failed_ops,
        duration: start.elapsed(),
        ids_by_producer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_values_decode() {
        for (p, i) in [(0, 0), (3, 17), (12, 999_999)] {
            let value = producer_mutation(p, i).filter().unwrap().value.as_i64().unwrap();
            assert_eq!(decode_producer_value(value), (p, i));
        }
    }
}
