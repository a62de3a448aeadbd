//! Batched fan-out with partial-failure aggregation.
//!
//! Input is partitioned into fixed-size chunks to respect provider limits.
//! Operations within a chunk run concurrently; the batch waits for every
//! outcome before starting the next chunk, so chunks are strictly
//! sequential. One item's failure never aborts its siblings.

use anyhow::Result;
use calbulk_core::{BATCH_CHUNK_SIZE, BulkOutcome, EventRef};
use futures::future::join_all;
use tracing::debug;

pub async fn run_batch<'a, F, Fut>(events: &'a [EventRef], op: F) -> BulkOutcome
where
    F: Fn(&'a EventRef) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut outcome = BulkOutcome::default();

    for chunk in events.chunks(BATCH_CHUNK_SIZE) {
        debug!(size = chunk.len(), "dispatching batch chunk");
        let results = join_all(chunk.iter().map(&op)).await;

        for (event, result) in chunk.iter().zip(results) {
            match result {
                Ok(()) => outcome.record_success(&event.event_id),
                Err(e) => outcome.record_failure(&event.event_id, format!("{:#}", e)),
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn refs(n: usize) -> Vec<EventRef> {
        (0..n).map(|i| EventRef::primary(format!("e{i}"))).collect()
    }

    #[tokio::test]
    async fn test_batch_accounts_for_every_input_exactly_once() {
        let events = refs(7);

        let outcome = run_batch(&events, |ev| {
            let fail = ev.event_id == "e2" || ev.event_id == "e5";
            async move {
                if fail {
                    anyhow::bail!("not found");
                }
                Ok(())
            }
        })
        .await;

        assert!(outcome.accounts_for(events.iter().map(|e| e.event_id.as_str())));
        assert_eq!(outcome.succeeded.len(), 5);
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.failed[0].error, "not found");
    }

    #[tokio::test]
    async fn test_chunks_run_sequentially() {
        // With 120 inputs and a chunk size of 50, in-flight concurrency can
        // never exceed the chunk size.
        let events = refs(120);
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let outcome = run_batch(&events, |_| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            async {
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert_eq!(outcome.succeeded.len(), 120);
        assert!(peak.load(Ordering::SeqCst) <= BATCH_CHUNK_SIZE);
    }

    #[tokio::test]
    async fn test_empty_batch_is_empty_outcome() {
        let outcome = run_batch(&[], |_| async { Ok(()) }).await;
        assert_eq!(outcome, BulkOutcome::default());
    }
}
