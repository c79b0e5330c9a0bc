//! Bounded fixed-interval polling
//!
//! A probe reports one of three outcomes per evaluation: ready, not yet, or
//! failed. The poller keeps probing on a fixed interval until the probe is
//! ready, fails, or the timeout elapses. There is no backoff.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use jobtree_common::{Error, Result, DEFAULT_POLL_INTERVAL};

/// What a single probe evaluation found
#[derive(Debug)]
pub enum PollOutcome<T> {
    Ready(T),
    NotYet,
    Failed(Error),
}

/// `NotFound` means the remote state has not propagated yet, so it maps to
/// `NotYet`. Every other error is terminal.
impl<T> From<Result<Option<T>>> for PollOutcome<T> {
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => PollOutcome::Ready(value),
            Ok(None) => PollOutcome::NotYet,
            Err(e) if e.is_not_found() => PollOutcome::NotYet,
            Err(e) => PollOutcome::Failed(e),
        }
    }
}

#[derive(Debug)]
enum PollState<T> {
    Polling,
    Succeeded(T),
    TimedOut(Duration),
    Failed(Error),
}

impl<T> PollState<T> {
    fn advance(outcome: PollOutcome<T>, waited: Duration, timeout: Duration) -> Self {
        match outcome {
            PollOutcome::Ready(value) => PollState::Succeeded(value),
            PollOutcome::Failed(e) => PollState::Failed(e),
            PollOutcome::NotYet if waited >= timeout => PollState::TimedOut(waited),
            PollOutcome::NotYet => PollState::Polling,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConditionPoller {
    interval: Duration,
}

impl Default for ConditionPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl ConditionPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Probe until ready. `condition` names what is being waited for in the
    /// timeout error.
    ///
    /// The probe takes no arguments: it captures the system it observes,
    /// typically a cloned [`JobApi`](crate::JobApi) or any other handle
    /// (UI state, a readiness endpoint), and re-reads it on every call.
    ///
    /// A probe that never becomes ready yields `Error::Timeout` no earlier
    /// than `timeout` and no later than `timeout` plus one interval (plus the
    /// probe's own latency).
    pub async fn until<T, F, Fut>(&self, condition: &str, timeout: Duration, mut probe: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PollOutcome<T>>,
    {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let outcome = probe().await;

            match PollState::advance(outcome, started.elapsed(), timeout) {
                PollState::Polling => sleep(self.interval).await,
                PollState::Succeeded(value) => {
                    debug!("'{}' met after {} attempt(s)", condition, attempts);
                    return Ok(value);
                }
                PollState::TimedOut(waited) => {
                    debug!("'{}' not met after {} attempt(s)", condition, attempts);
                    return Err(Error::Timeout {
                        condition: condition.to_string(),
                        waited,
                    });
                }
                PollState::Failed(e) => {
                    debug!("'{}' failed on attempt {}: {}", condition, attempts, e);
                    return Err(e);
                }
            }
        }
    }

    /// Probe a boolean predicate until it returns true
    pub async fn until_true<F, Fut>(&self, condition: &str, timeout: Duration, mut predicate: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.until(condition, timeout, || {
            let check = predicate();
            async move {
                if check.await {
                    PollOutcome::Ready(())
                } else {
                    PollOutcome::NotYet
                }
            }
        })
        .await
    }
}
