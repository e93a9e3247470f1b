use std::time::Duration;

use async_trait::async_trait;

/// Delay source for retry backoff and inter-batch pauses.
///
/// Production code uses [`TokioSleeper`]; tests swap in a recorder so retry
/// and pacing logic runs without wall-clock waits.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
