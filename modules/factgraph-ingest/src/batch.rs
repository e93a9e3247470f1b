use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use tracing::{info, warn};

use factgraph_common::{BatchReport, ProcessOutcome, RawItem, Sleeper};

use crate::pipeline::IngestPipeline;

/// Ids listed in a [`BatchReport`].
pub const SAMPLE_SIZE: usize = 10;
/// Most items taken from one dataset load.
pub const MAX_DATASET_ITEMS: usize = 200;

/// Runs items through the pipeline in fixed-size concurrent batches, one
/// batch at a time, pausing between batches.
pub struct Batcher {
    pipeline: IngestPipeline,
    sleeper: Arc<dyn Sleeper>,
    batch_size: usize,
    pause: Duration,
}

impl Batcher {
    pub fn new(
        pipeline: IngestPipeline,
        sleeper: Arc<dyn Sleeper>,
        batch_size: usize,
        pause: Duration,
    ) -> Self {
        Self {
            pipeline,
            sleeper,
            batch_size: batch_size.max(1),
            pause,
        }
    }

    /// Process every item. A failing item, including one that panics, only
    /// counts against itself.
    pub async fn ingest_batch(&self, items: &[RawItem]) -> BatchReport {
        let mut report = BatchReport {
            total_items: items.len(),
            ..Default::default()
        };
        let batches = items.len().div_ceil(self.batch_size);

        for (n, chunk) in items.chunks(self.batch_size).enumerate() {
            info!(batch = n + 1, batches, size = chunk.len(), "Processing batch");

            let results = join_all(chunk.iter().map(|item| self.run_one(item))).await;
            for outcome in results {
                match outcome {
                    Some(o) if o.is_success() => {
                        report.succeeded += 1;
                        if report.sample_succeeded_ids.len() < SAMPLE_SIZE {
                            report.sample_succeeded_ids.push(o.post_id);
                        }
                    }
                    _ => report.failed += 1,
                }
            }

            if n + 1 < batches {
                self.sleeper.sleep(self.pause).await;
            }
        }

        info!(
            total = report.total_items,
            succeeded = report.succeeded,
            failed = report.failed,
            "Ingest finished"
        );
        report
    }

    /// `None` when the item errored or panicked.
    async fn run_one(&self, item: &RawItem) -> Option<ProcessOutcome> {
        match AssertUnwindSafe(self.pipeline.process_item(item))
            .catch_unwind()
            .await
        {
            Ok(Ok(outcome)) => {
                if let Some(message) = &outcome.message {
                    warn!(post_id = %outcome.post_id, reason = %message, "Item not ingested");
                }
                Some(outcome)
            }
            Ok(Err(e)) => {
                warn!(post_id = ?item.id(), error = %e, "Item failed");
                None
            }
            Err(_) => {
                warn!(post_id = ?item.id(), "Item processing panicked");
                None
            }
        }
    }
}

/// Assign dataset-scoped ids and cap the load at [`MAX_DATASET_ITEMS`].
/// Items keep any other fields they carry; an existing `id` is replaced.
pub fn prepare_dataset_items(dataset: &str, split: &str, items: Vec<RawItem>) -> Vec<RawItem> {
    let prefix = format!("{}_{}", dataset.replace('/', "_"), split);
    items
        .into_iter()
        .take(MAX_DATASET_ITEMS)
        .enumerate()
        .map(|(i, mut item)| {
            item.set("id", format!("{prefix}_{i}"));
            item
        })
        .collect()
}
