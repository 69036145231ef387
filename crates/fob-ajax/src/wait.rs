//! Bounded polling against the observed context.
//!
//! Everything that waits on the context (interceptor setup, page load) goes
//! through [`wait_until`]: a fixed-interval retry loop with a deadline. It
//! reports `false` on timeout and leaves turning that into an error to the
//! caller, since only the caller knows which failure it means.

use crate::error::Result;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::trace;

/// Default timeout for wait operations (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default poll interval for checking conditions (100ms).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long interceptor setup waits for the store to appear.
pub const SETUP_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Configuration for wait operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Maximum time to wait for the condition.
    pub timeout: Duration,

    /// How often to check if the condition is satisfied.
    pub poll_interval: Duration,
}

impl WaitConfig {
    /// Creates a new wait configuration.
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Creates a config with custom timeout and default poll interval.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, DEFAULT_POLL_INTERVAL)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// Polls `predicate` until it yields `Ok(true)` or the timeout elapses.
///
/// The predicate is always polled at least once. An `Err` from the
/// predicate counts as "not yet": the context may be mid-navigation and
/// unable to answer. A predicate still pending at the deadline is dropped,
/// so the loop never outlives `config.timeout` by more than one poll.
///
/// Returns `true` if the predicate was satisfied, `false` on timeout.
///
/// # Example
///
/// ```ignore
/// let ready = wait_until(
///     || async { Ok(page.title().await? == "Loaded") },
///     WaitConfig::with_timeout(Duration::from_secs(5)),
/// )
/// .await;
/// ```
pub async fn wait_until<F, Fut>(predicate: F, config: WaitConfig) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let remaining = config.timeout.saturating_sub(start.elapsed());
        match timeout(remaining, predicate()).await {
            Ok(Ok(true)) => return true,
            Ok(Ok(false)) => {}
            Ok(Err(e)) => trace!(attempt = attempts, "wait predicate failed: {e}"),
            Err(_) => trace!(attempt = attempts, "wait predicate still pending at deadline"),
        }

        let remaining = config.timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            trace!(attempts, "wait timed out after {:?}", config.timeout);
            return false;
        }

        sleep(config.poll_interval.min(remaining)).await;
    }
}
