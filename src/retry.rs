//! Bounded retry with a fixed delay between attempts.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included
    pub max_attempts: u32,
    /// Pause before every attempt after the first
    pub delay: Duration,
}

impl RetryPolicy {
    /// Aurora Serverless needs a few seconds to resume a paused cluster.
    pub fn aurora_resume() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(30),
        }
    }

    /// Runs `op` until it succeeds, fails with an error `retryable` rejects,
    /// or the attempts run out. The last error is returned.
    pub async fn run<F, Fut, T, E, P>(&self, mut op: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && retryable(&err) => {
                    warn!(
                        "Attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt, self.max_attempts, err, self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::aurora_resume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting() -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        let counter = Arc::new(AtomicU32::new(0));
        (counter.clone(), counter)
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_after_the_delay() {
        let policy = RetryPolicy::aurora_resume();
        let (counter, counter_clone) = counting();
        let started = tokio::time::Instant::now();

        let result = policy
            .run(
                move || {
                    let attempt = counter_clone.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if attempt == 0 {
                            Err("cluster paused")
                        } else {
                            Ok(7)
                        }
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy::aurora_resume();
        let (counter, counter_clone) = counting();

        let result: Result<(), _> = policy
            .run(
                move || {
                    counter_clone.fetch_add(1, Ordering::SeqCst);
                    async { Err("still paused") }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Err("still paused"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_fail_immediately() {
        let policy = RetryPolicy {
            max_attempts: 5,
            delay: Duration::from_secs(3600),
        };
        let (counter, counter_clone) = counting();

        let result: Result<(), _> = policy
            .run(
                move || {
                    counter_clone.fetch_add(1, Ordering::SeqCst);
                    async { Err("syntax error") }
                },
                |err: &&str| !err.contains("syntax"),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
