//! Bounded retry with linear backoff, gated on an independent
//! connectivity probe.
//!
//! Retry exists only for "the network is the problem": operations failing
//! with a retryable error wait for connectivity and run again, anything else
//! propagates immediately for domain-specific handling.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{ConnectivityProbe, Sleeper};

/// Classification carried on an error value.
///
/// `true` means the failure is attributable to network reachability rather
/// than the remote service's logic.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Terminal result of a retried operation
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every allowed attempt failed with a retryable error
    #[error("{op} gave up after {attempts} attempts: {last}")]
    Exhausted {
        op: &'static str,
        attempts: u32,
        last: E,
    },
    /// The operation failed in a way retrying cannot fix
    #[error("{0}")]
    Fatal(E),
}

/// Retry policy wrapping a fallible operation.
///
/// On a retryable failure the policy computes a linear backoff
/// (`base_delay * attempt`), then blocks re-probing connectivity until the
/// probe reports reachable, sleeping the backoff between probes. The
/// operation is never re-invoked while the probe reports unreachable. This
/// decouples "the server is down" from "my network is down".
pub struct RetryPolicy<P: ?Sized, S: ?Sized> {
    probe: Arc<P>,
    sleeper: Arc<S>,
    max_retries: u32,
    base_delay: Duration,
}

impl<P, S> RetryPolicy<P, S>
where
    P: ConnectivityProbe + ?Sized,
    S: Sleeper + ?Sized,
{
    pub const DEFAULT_MAX_RETRIES: u32 = 10;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(30);

    pub fn new(probe: Arc<P>, sleeper: Arc<S>) -> Self {
        Self::with_limits(
            probe,
            sleeper,
            Self::DEFAULT_MAX_RETRIES,
            Self::DEFAULT_BASE_DELAY,
        )
    }

    pub fn with_limits(
        probe: Arc<P>,
        sleeper: Arc<S>,
        max_retries: u32,
        base_delay: Duration,
    ) -> Self {
        Self {
            probe,
            sleeper,
            max_retries,
            base_delay,
        }
    }

    /// Run `operation`, retrying retryable failures up to the configured
    /// bound. The wait before the Nth retry equals `base_delay * N`.
    pub async fn execute<T, E, F, Fut>(
        &self,
        op: &'static str,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(RetryError::Exhausted {
                            op,
                            attempts: attempt,
                            last: error,
                        });
                    }

                    let wait = self.base_delay * attempt;
                    tracing::warn!(op, attempt, error = %error, "retryable failure, checking connectivity");

                    while !self.probe.is_reachable().await {
                        tracing::warn!(
                            op,
                            wait_secs = wait.as_secs(),
                            "no connectivity, probing again after backoff"
                        );
                        self.sleeper.sleep(wait).await;
                    }

                    tracing::info!(op, attempt, "connectivity confirmed, retrying");
                }
                Err(error) => return Err(RetryError::Fatal(error)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("connection reset")]
        Transient,
        #[error("malformed payload")]
        Permanent,
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    /// Probe that answers a scripted sequence, then stays reachable
    struct ScriptedProbe {
        answers: Mutex<Vec<bool>>,
        calls: AtomicU32,
    }

    impl ScriptedProbe {
        fn new(answers: Vec<bool>) -> Self {
            Self {
                answers: Mutex::new(answers),
                calls: AtomicU32::new(0),
            }
        }

        fn always_reachable() -> Self {
            Self::new(vec![])
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConnectivityProbe for ScriptedProbe {
        async fn is_reachable(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                true
            } else {
                answers.remove(0)
            }
        }
    }

    /// Sleeper that records requested durations and returns immediately
    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn slept(&self) -> Vec<Duration> {
            self.slept.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    fn policy(
        probe: Arc<ScriptedProbe>,
        sleeper: Arc<RecordingSleeper>,
        max_retries: u32,
    ) -> RetryPolicy<ScriptedProbe, RecordingSleeper> {
        RetryPolicy::with_limits(probe, sleeper, max_retries, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn success_passes_through_without_probing() {
        let probe = Arc::new(ScriptedProbe::always_reachable());
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = policy(Arc::clone(&probe), Arc::clone(&sleeper), 3);

        let result: Result<u32, RetryError<TestError>> =
            policy.execute("op", || async { Ok(42) }).await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(probe.calls(), 0);
        assert!(sleeper.slept().is_empty());
    }

    #[tokio::test]
    async fn retries_transient_failure_until_success() {
        let probe = Arc::new(ScriptedProbe::always_reachable());
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = policy(Arc::clone(&probe), Arc::clone(&sleeper), 3);

        let invocations = AtomicU32::new(0);
        let result: Result<u32, RetryError<TestError>> = policy
            .execute("op", || {
                let n = invocations.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TestError::Transient)
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(invocations.load(Ordering::SeqCst), 3);
        // Reachable on the first probe both times, so no backoff sleeps
        assert!(sleeper.slept().is_empty());
    }

    #[tokio::test]
    async fn backoff_is_linear_in_attempt_count() {
        // Unreachable once before each of the first two retries
        let probe = Arc::new(ScriptedProbe::new(vec![false, true, false, true]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = policy(Arc::clone(&probe), Arc::clone(&sleeper), 5);

        let invocations = AtomicU32::new(0);
        let result: Result<u32, RetryError<TestError>> = policy
            .execute("op", || {
                let n = invocations.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TestError::Transient)
                    } else {
                        Ok(1)
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(
            sleeper.slept(),
            vec![Duration::from_secs(30), Duration::from_secs(60)]
        );
    }

    #[tokio::test]
    async fn never_invokes_operation_while_unreachable() {
        let probe = Arc::new(ScriptedProbe::new(vec![false, false, false, true]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = policy(Arc::clone(&probe), Arc::clone(&sleeper), 3);

        let invocations = Arc::new(AtomicU32::new(0));
        let probe_ref = Arc::clone(&probe);
        let invocations_ref = Arc::clone(&invocations);
        let result: Result<u32, RetryError<TestError>> = policy
            .execute("op", move || {
                let n = invocations_ref.fetch_add(1, Ordering::SeqCst);
                // The retry happens only after the probe finally answered
                if n == 1 {
                    assert_eq!(probe_ref.calls(), 4);
                }
                async move {
                    if n == 0 {
                        Err(TestError::Transient)
                    } else {
                        Ok(9)
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(invocations.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.slept().len(), 3);
    }

    #[tokio::test]
    async fn exhausts_after_max_retries() {
        let probe = Arc::new(ScriptedProbe::always_reachable());
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = policy(Arc::clone(&probe), Arc::clone(&sleeper), 3);

        let invocations = AtomicU32::new(0);
        let result: Result<u32, RetryError<TestError>> = policy
            .execute("op", || {
                invocations.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient) }
            })
            .await;

        // Initial call plus three retries
        assert_eq!(invocations.load(Ordering::SeqCst), 4);
        assert!(matches!(
            result,
            Err(RetryError::Exhausted { attempts: 4, .. })
        ));
    }

    #[tokio::test]
    async fn permanent_failure_propagates_immediately() {
        let probe = Arc::new(ScriptedProbe::always_reachable());
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = policy(Arc::clone(&probe), Arc::clone(&sleeper), 3);

        let invocations = AtomicU32::new(0);
        let result: Result<u32, RetryError<TestError>> = policy
            .execute("op", || {
                invocations.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Permanent) }
            })
            .await;

        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(RetryError::Fatal(_))));
        assert_eq!(probe.calls(), 0);
    }
}
