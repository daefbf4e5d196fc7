//! Bounded poll: fixed interval, fixed attempt budget
//!
//! Used at every synchronization point where the workflows wait for an
//! eventually consistent external system. The sleep is injected so tests can
//! count attempts without waiting in real time.

use async_trait::async_trait;
use shardlift_common::{Error, PollPolicy, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Suspends the current task between probes
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `probe` until it reports `true` or the attempt budget is spent
///
/// Returns the number of probes it took. A probe error is returned at once
/// and is never reported as a timeout. `on_retry` sees the attempt number of
/// every unsuccessful probe that is followed by a sleep; there is no sleep
/// after the final probe.
pub async fn poll_until<S, F, Fut, R>(
    policy: &PollPolicy,
    sleeper: &S,
    condition: &str,
    mut on_retry: R,
    mut probe: F,
) -> Result<u32>
where
    S: Sleeper + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
    R: FnMut(u32),
{
    if policy.max_attempts == 0 {
        return Err(Error::Config(format!(
            "poll for {:?} needs at least one attempt",
            condition
        )));
    }

    for attempt in 1..=policy.max_attempts {
        if probe().await? {
            debug!(attempt, condition, "Poll condition met");
            return Ok(attempt);
        }

        if attempt == policy.max_attempts {
            break;
        }

        on_retry(attempt);
        sleeper.sleep(policy.interval).await;
    }

    Err(Error::Timeout {
        condition: condition.to_string(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(max_attempts, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_success_on_first_probe() {
        let sleeper = RecordingSleeper::default();
        let probes = AtomicU32::new(0);

        let attempts = poll_until(&policy(10), &sleeper, "ready", |_| {}, || async {
            probes.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        })
        .await
        .unwrap();

        assert_eq!(attempts, 1);
        assert_eq!(probes.load(Ordering::SeqCst), 1);
        assert!(sleeper.sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_after_retries_does_not_sleep_after_final_check() {
        let sleeper = RecordingSleeper::default();
        let probes = AtomicU32::new(0);
        let mut retries = Vec::new();

        let attempts = poll_until(
            &policy(10),
            &sleeper,
            "ready",
            |attempt| retries.push(attempt),
            || async { Ok(probes.fetch_add(1, Ordering::SeqCst) + 1 == 3) },
        )
        .await
        .unwrap();

        assert_eq!(attempts, 3);
        assert_eq!(retries, vec![1, 2]);
        assert_eq!(
            *sleeper.sleeps.lock().unwrap(),
            vec![Duration::from_secs(5), Duration::from_secs(5)]
        );
    }

    #[tokio::test]
    async fn test_timeout_after_exactly_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let probes = AtomicU32::new(0);

        let err = poll_until(&policy(4), &sleeper, "nodes to join", |_| {}, || async {
            probes.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        })
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(probes.load(Ordering::SeqCst), 4);
        assert_eq!(sleeper.sleeps.lock().unwrap().len(), 3);
        assert_eq!(err.to_string(), "timed out after 4 attempts waiting for nodes to join");
    }

    #[tokio::test]
    async fn test_probe_error_propagates_immediately() {
        let sleeper = RecordingSleeper::default();
        let probes = AtomicU32::new(0);

        let err = poll_until(&policy(5), &sleeper, "ready", |_| {}, || async {
            if probes.fetch_add(1, Ordering::SeqCst) == 1 {
                Err(Error::Api {
                    operation: "CatShards",
                    status: 500,
                    body: "boom".to_string(),
                })
            } else {
                Ok(false)
            }
        })
        .await
        .unwrap_err();

        assert!(!err.is_timeout());
        assert!(matches!(err, Error::Api { status: 500, .. }));
        assert_eq!(probes.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.sleeps.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_is_config_error() {
        let sleeper = RecordingSleeper::default();

        let err = poll_until(&policy(0), &sleeper, "ready", |_| {}, || async { Ok(true) })
            .await
            .unwrap_err();

        assert!(err.is_config());
    }
}
