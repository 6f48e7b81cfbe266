//! Blocking wait mechanism
//!
//! Polls a fallible predicate until it holds or a timeout elapses. Page
//! readiness ([`crate::Container::when_ready`]) is built on this.
//!
//! The predicate is always checked at least once, and once more after the
//! final sleep, so a zero timeout still gives it a chance.

use crate::result::{EdslError, EdslResult};
use std::time::{Duration, Instant};
use tracing::trace;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set timeout from a duration, saturating at `u64::MAX` milliseconds
    #[must_use]
    pub fn with_timeout_duration(self, timeout: Duration) -> Self {
        self.with_timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the predicate was evaluated
    pub attempts: u32,
}

// =============================================================================
// WAITING
// =============================================================================

/// Poll `predicate` until it returns `true`.
///
/// Errors raised by the predicate abort the wait and are returned as-is.
/// Running out of time yields [`EdslError::Timeout`].
pub fn wait_for_function<F>(mut predicate: F, options: &WaitOptions) -> EdslResult<WaitResult>
where
    F: FnMut() -> EdslResult<bool>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let poll_interval = options.poll_interval();
    let mut attempts = 0_u32;

    loop {
        attempts = attempts.saturating_add(1);
        if predicate()? {
            trace!(attempts, elapsed_ms = start.elapsed().as_millis(), "wait satisfied");
            return Ok(WaitResult {
                elapsed: start.elapsed(),
                attempts,
            });
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            break;
        }
        std::thread::sleep(poll_interval.min(timeout - elapsed));
    }

    Err(EdslError::Timeout {
        ms: options.timeout_ms,
    })
}

/// Wait for a condition with the default poll interval
pub fn wait_until<F>(predicate: F, timeout_ms: u64) -> EdslResult<()>
where
    F: FnMut() -> EdslResult<bool>,
{
    let options = WaitOptions::new().with_timeout(timeout_ms);
    let _ = wait_for_function(predicate, &options)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = WaitOptions::default();
            assert_eq!(options.timeout_ms, 30_000);
            assert_eq!(options.poll_interval_ms, 50);
            assert_eq!(options.timeout(), Duration::from_secs(30));
        }

        #[test]
        fn test_builders() {
            let options = WaitOptions::new()
                .with_timeout_duration(Duration::from_millis(1500))
                .with_poll_interval(5);
            assert_eq!(options.timeout_ms, 1500);
            assert_eq!(options.poll_interval(), Duration::from_millis(5));
        }
    }

    mod wait_tests {
        use super::*;

        #[test]
        fn test_immediate_success() {
            let result = wait_for_function(|| Ok(true), &WaitOptions::new()).unwrap();
            assert_eq!(result.attempts, 1);
        }

        #[test]
        fn test_zero_timeout_still_checks_once() {
            let options = WaitOptions::new().with_timeout(0);
            assert!(wait_for_function(|| Ok(true), &options).is_ok());
        }

        #[test]
        fn test_eventual_success() {
            let mut calls = 0;
            let options = WaitOptions::new().with_timeout(2_000).with_poll_interval(1);
            let result = wait_for_function(
                || {
                    calls += 1;
                    Ok(calls >= 3)
                },
                &options,
            )
            .unwrap();
            assert_eq!(result.attempts, 3);
        }

        #[test]
        fn test_timeout() {
            let options = WaitOptions::new().with_timeout(20).with_poll_interval(5);
            let err = wait_for_function(|| Ok(false), &options).unwrap_err();
            assert!(matches!(err, EdslError::Timeout { ms: 20 }));
        }

        #[test]
        fn test_predicate_error_propagates() {
            let options = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            let err = wait_for_function(|| Err(EdslError::custom("probe failed")), &options)
                .unwrap_err();
            assert_eq!(err.to_string(), "probe failed");
        }

        #[test]
        fn test_wait_until() {
            assert!(wait_until(|| Ok(true), 10).is_ok());
            assert!(wait_until(|| Ok(false), 10).is_err());
        }
    }
}
