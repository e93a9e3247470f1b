//! Bounded, serialized connection management.
//!
//! The first use of the store connects lazily. A failed attempt is retried
//! after a fixed delay up to [`RetryPolicy::max_attempts`] times; after that
//! the adapter reports itself exhausted and fails fast until an explicit
//! [`Reconnector::reconnect`]. All state changes happen under one async
//! mutex, so concurrent callers never race each other into duplicate
//! connection attempts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use factgraph_common::Sleeper;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::store::StoreError;

/// Opens one connection handle.
#[async_trait]
pub trait Connector: Send + Sync {
    type Handle: Clone + Send + Sync;

    async fn connect(&self) -> Result<Self::Handle, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    pub attempts: u32,
    pub exhausted: bool,
}

/// A handle tagged with the connection it came from. Pass the generation
/// back to [`Reconnector::invalidate`] when the handle fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease<H> {
    pub handle: H,
    pub generation: u64,
}

struct ConnState<H> {
    handle: Option<H>,
    attempts: u32,
    exhausted: bool,
    // Bumped on every successful connect; never reset.
    generation: u64,
}

impl<H> Default for ConnState<H> {
    fn default() -> Self {
        Self {
            handle: None,
            attempts: 0,
            exhausted: false,
            generation: 0,
        }
    }
}

impl<H> ConnState<H> {
    fn reset(&mut self) {
        self.handle = None;
        self.attempts = 0;
        self.exhausted = false;
    }
}

pub struct Reconnector<C: Connector> {
    connector: C,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    state: Mutex<ConnState<C::Handle>>,
}

impl<C: Connector> Reconnector<C> {
    pub fn new(connector: C, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            connector,
            policy,
            sleeper,
            state: Mutex::new(ConnState::default()),
        }
    }

    /// Live handle, connecting first if needed.
    pub async fn acquire(&self) -> Result<Lease<C::Handle>, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(handle) = &state.handle {
            return Ok(Lease {
                handle: handle.clone(),
                generation: state.generation,
            });
        }
        if state.exhausted {
            return Err(StoreError::Unavailable(format!(
                "gave up after {} connection attempts",
                state.attempts
            )));
        }

        let mut last_err = None;
        while state.attempts < self.policy.max_attempts {
            if state.attempts > 0 {
                self.sleeper.sleep(self.policy.delay).await;
            }
            state.attempts += 1;
            match self.connector.connect().await {
                Ok(handle) => {
                    state.generation += 1;
                    info!(
                        attempt = state.attempts,
                        generation = state.generation,
                        "Graph store connected"
                    );
                    state.handle = Some(handle.clone());
                    return Ok(Lease {
                        handle,
                        generation: state.generation,
                    });
                }
                Err(e) => {
                    warn!(
                        attempt = state.attempts,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "Graph store connection failed"
                    );
                    last_err = Some(e);
                }
            }
        }

        state.exhausted = true;
        error!(attempts = state.attempts, "Graph store connection attempts exhausted");
        Err(StoreError::Unavailable(match last_err {
            Some(e) => format!("gave up after {} connection attempts: {e}", state.attempts),
            None => format!("gave up after {} connection attempts", state.attempts),
        }))
    }

    /// Drop the handle from `generation` after a mid-operation connection
    /// failure. The next call reconnects with a fresh attempt budget. A stale
    /// generation is ignored, so a late failure on an old handle never tears
    /// down a newer connection.
    pub async fn invalidate(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.handle.is_none() || state.generation != generation {
            debug!(generation, current = state.generation, "Ignoring stale invalidation");
            return;
        }
        warn!(generation, "Graph store connection lost, will reconnect on next use");
        state.reset();
    }

    /// Reset the attempt budget, including after exhaustion, and connect.
    pub async fn reconnect(&self) -> Result<C::Handle, StoreError> {
        self.state.lock().await.reset();
        self.acquire().await.map(|lease| lease.handle)
    }

    pub async fn status(&self) -> ConnectionStatus {
        let state = self.state.lock().await;
        ConnectionStatus {
            connected: state.handle.is_some(),
            attempts: state.attempts,
            exhausted: state.exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Fails the first `failures` connects, then hands out increasing ids.
    struct FlakyConnector {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyConnector {
        fn failing(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Connector for FlakyConnector {
        type Handle = u32;

        async fn connect(&self) -> Result<u32, StoreError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                Err(StoreError::Unavailable("connection refused".into()))
            } else {
                Ok(n)
            }
        }
    }

    #[derive(Default)]
    struct RecordingSleeper(StdMutex<Vec<Duration>>);

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    fn reconnector(failures: u32, sleeper: Arc<RecordingSleeper>) -> Reconnector<FlakyConnector> {
        Reconnector::new(
            FlakyConnector::failing(failures),
            RetryPolicy {
                max_attempts: 5,
                delay: Duration::from_secs(5),
            },
            sleeper,
        )
    }

    #[tokio::test]
    async fn retries_with_delay_between_attempts_only() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let r = reconnector(2, sleeper.clone());

        assert_eq!(r.acquire().await.unwrap().handle, 3);
        assert_eq!(*sleeper.0.lock().unwrap(), vec![Duration::from_secs(5); 2]);
        assert_eq!(
            r.status().await,
            ConnectionStatus {
                connected: true,
                attempts: 3,
                exhausted: false
            }
        );
    }

    #[tokio::test]
    async fn cached_handle_is_reused() {
        let r = reconnector(0, Arc::new(RecordingSleeper::default()));
        assert_eq!(r.acquire().await.unwrap().handle, 1);
        assert_eq!(r.acquire().await.unwrap().handle, 1);
        assert_eq!(r.connector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_fails_fast_until_reconnect() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let r = reconnector(7, sleeper.clone());

        let err = r.acquire().await.unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(r.connector.calls.load(Ordering::SeqCst), 5);
        assert_eq!(sleeper.0.lock().unwrap().len(), 4);

        // No further attempts while exhausted.
        assert!(r.acquire().await.unwrap_err().is_unavailable());
        assert_eq!(r.connector.calls.load(Ordering::SeqCst), 5);
        assert!(r.status().await.exhausted);

        // Connects 6 and 7 fail, 8 succeeds.
        assert_eq!(r.reconnect().await.unwrap(), 8);
        assert!(!r.status().await.exhausted);
    }

    #[tokio::test]
    async fn invalidate_forces_a_fresh_connection() {
        let r = reconnector(0, Arc::new(RecordingSleeper::default()));
        let first = r.acquire().await.unwrap();
        assert_eq!(first, Lease { handle: 1, generation: 1 });
        r.invalidate(first.generation).await;
        assert_eq!(r.status().await.attempts, 0);
        assert_eq!(r.acquire().await.unwrap(), Lease { handle: 2, generation: 2 });
    }

    #[tokio::test]
    async fn late_failure_on_old_handle_keeps_new_connection() {
        let r = reconnector(0, Arc::new(RecordingSleeper::default()));
        let old = r.acquire().await.unwrap();

        // Two callers saw the same handle fail; the first reconnects.
        r.invalidate(old.generation).await;
        let fresh = r.acquire().await.unwrap();
        assert_eq!(fresh.handle, 2);

        r.invalidate(old.generation).await;
        assert_eq!(r.acquire().await.unwrap(), fresh);
        assert_eq!(r.connector.calls.load(Ordering::SeqCst), 2);
        assert!(r.status().await.connected);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_connection() {
        let r = Arc::new(reconnector(0, Arc::new(RecordingSleeper::default())));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = r.clone();
                tokio::spawn(async move { r.acquire().await.unwrap().handle })
            })
            .collect();
        for h in handles {
            assert_eq!(h.await.unwrap(), 1);
        }
        assert_eq!(r.connector.calls.load(Ordering::SeqCst), 1);
    }
}
