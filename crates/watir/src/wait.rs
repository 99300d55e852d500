//! Wait engine
//!
//! Deadline-bounded polling used by every implicit and explicit wait.
//!
//! - Each wait computes its own deadline, so nested waits are independent.
//! - A timeout of `0` evaluates the condition exactly once and never sleeps.
//! - The last sleep is clipped to the deadline.

use crate::result::{WatirError, WatirResult};
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

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

/// Outcome of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the condition was evaluated
    pub polls: u32,
}

// =============================================================================
// WAIT
// =============================================================================

/// Polling primitives
#[derive(Debug, Clone, Copy, Default)]
pub struct Wait;

impl Wait {
    /// Poll until `predicate` returns true
    pub fn until<F>(options: &WaitOptions, message: &str, mut predicate: F) -> WatirResult<WaitResult>
    where
        F: FnMut() -> bool,
    {
        Self::poll(options, message, || Ok(predicate()))
    }

    /// Poll until `predicate` returns false
    pub fn while_<F>(options: &WaitOptions, message: &str, mut predicate: F) -> WatirResult<WaitResult>
    where
        F: FnMut() -> bool,
    {
        Self::poll(options, message, || Ok(!predicate()))
    }

    /// Poll a fallible predicate until it returns `Ok(true)`; errors abort the wait
    pub fn until_ok<F>(options: &WaitOptions, message: &str, predicate: F) -> WatirResult<WaitResult>
    where
        F: FnMut() -> WatirResult<bool>,
    {
        Self::poll(options, message, predicate)
    }

    /// Poll a fallible predicate until it returns `Ok(false)`; errors abort the wait
    pub fn while_ok<F>(options: &WaitOptions, message: &str, mut predicate: F) -> WatirResult<WaitResult>
    where
        F: FnMut() -> WatirResult<bool>,
    {
        Self::poll(options, message, || predicate().map(|held| !held))
    }

    fn poll<F>(options: &WaitOptions, message: &str, mut check: F) -> WatirResult<WaitResult>
    where
        F: FnMut() -> WatirResult<bool>,
    {
        let start = Instant::now();
        let deadline = start + options.timeout();
        let mut polls = 0_u32;

        loop {
            polls = polls.saturating_add(1);
            if check()? {
                return Ok(WaitResult {
                    elapsed: start.elapsed(),
                    polls,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(options.poll_interval().min(deadline - now));
        }

        tracing::trace!(polls, timeout_ms = options.timeout_ms, message, "wait timed out");
        Err(WatirError::Timeout {
            message: message.to_string(),
            timeout_ms: options.timeout_ms,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::cell::Cell;

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_wait_options_chained() {
            let opts = WaitOptions::new().with_timeout(10_000).with_poll_interval(200);
            assert_eq!(opts.timeout(), Duration::from_millis(10_000));
            assert_eq!(opts.poll_interval(), Duration::from_millis(200));
        }
    }

    mod poll_tests {
        use super::*;

        #[test]
        fn test_until_succeeds_immediately() {
            let result = Wait::until(&WaitOptions::new(), "ready", || true).unwrap();
            assert_eq!(result.polls, 1);
        }

        #[test]
        fn test_until_succeeds_after_a_few_polls() {
            let calls = Cell::new(0);
            let opts = WaitOptions::new().with_timeout(2_000).with_poll_interval(1);
            let result = Wait::until(&opts, "third time", || {
                calls.set(calls.get() + 1);
                calls.get() == 3
            })
            .unwrap();
            assert_eq!(result.polls, 3);
        }

        #[test]
        fn test_while_waits_for_false() {
            let calls = Cell::new(0);
            let opts = WaitOptions::new().with_timeout(2_000).with_poll_interval(1);
            Wait::while_(&opts, "busy", || {
                calls.set(calls.get() + 1);
                calls.get() < 2
            })
            .unwrap();
            assert_eq!(calls.get(), 2);
        }

        #[test]
        fn test_timeout_error_carries_message_and_budget() {
            let opts = WaitOptions::new().with_timeout(20).with_poll_interval(5);
            let err = Wait::until(&opts, "waiting for godot", || false).unwrap_err();
            match err {
                WatirError::Timeout { message, timeout_ms } => {
                    assert_eq!(message, "waiting for godot");
                    assert_eq!(timeout_ms, 20);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_zero_timeout_checks_once_without_sleeping() {
            let calls = Cell::new(0);
            let opts = WaitOptions::new().with_timeout(0).with_poll_interval(10_000);
            let start = Instant::now();
            let err = Wait::until(&opts, "never", || {
                calls.set(calls.get() + 1);
                false
            })
            .unwrap_err();
            assert!(err.is_timeout());
            assert_eq!(calls.get(), 1);
            assert!(start.elapsed() < Duration::from_secs(1));
        }

        #[test]
        fn test_last_sleep_is_clipped_to_deadline() {
            let opts = WaitOptions::new().with_timeout(30).with_poll_interval(10_000);
            let start = Instant::now();
            assert!(Wait::until(&opts, "never", || false).is_err());
            assert!(start.elapsed() < Duration::from_secs(5));
        }

        #[test]
        fn test_errors_abort_the_wait() {
            let calls = Cell::new(0);
            let opts = WaitOptions::new().with_timeout(5_000).with_poll_interval(1);
            let err = Wait::until_ok(&opts, "boom", || {
                calls.set(calls.get() + 1);
                Err(WatirError::invalid_selector("bad key"))
            })
            .unwrap_err();
            assert!(matches!(err, WatirError::InvalidSelector { .. }));
            assert_eq!(calls.get(), 1);
        }

        #[test]
        fn test_while_ok() {
            let opts = WaitOptions::new().with_timeout(0);
            assert!(Wait::while_ok(&opts, "gone", || Ok(false)).is_ok());
            assert!(Wait::while_ok(&opts, "gone", || Ok(true)).is_err());
        }

        #[test]
        fn test_nested_waits_keep_their_own_deadlines() {
            let outer = WaitOptions::new().with_timeout(2_000).with_poll_interval(1);
            let inner = WaitOptions::new().with_timeout(0);
            let inner_timeouts = Cell::new(0);
            Wait::until(&outer, "outer", || {
                if Wait::until(&inner, "inner", || false).is_err() {
                    inner_timeouts.set(inner_timeouts.get() + 1);
                }
                inner_timeouts.get() == 2
            })
            .unwrap();
            assert_eq!(inner_timeouts.get(), 2);
        }
    }
}
