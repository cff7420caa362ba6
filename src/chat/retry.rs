//! Fixed-schedule retry for rate-limited calls.

use crate::error::{SyncError, SyncResultOf};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Result of one attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    /// Rate limited; try again after the next backoff delay.
    Retryable,
    Fatal(SyncError),
}

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Delay table: one retry per entry after the first attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(&[1000, 2000, 4000])
    }
}

impl RetryPolicy {
    pub fn from_millis(schedule: &[u64]) -> Self {
        Self {
            backoff: schedule.iter().copied().map(Duration::from_millis).collect(),
        }
    }

    /// Maximum number of attempts, first one included.
    pub fn max_attempts(&self) -> usize {
        self.backoff.len() + 1
    }

    /// Run `op` until it succeeds, fails fatally, or the schedule is exhausted.
    pub async fn run<T, F, Fut>(&self, sleeper: &dyn Sleeper, label: &str, mut op: F) -> SyncResultOf<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Attempt::Success(value) => return Ok(value),
                Attempt::Fatal(e) => return Err(e),
                Attempt::Retryable => {
                    let Some(delay) = self.backoff.get(attempt - 1) else {
                        warn!(call = label, attempts = attempt, "Rate limit retries exhausted");
                        return Err(SyncError::RateLimited { attempts: attempt });
                    };
                    warn!(
                        call = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, retrying"
                    );
                    sleeper.sleep(*delay).await;
                }
            }
        }
    }
}
