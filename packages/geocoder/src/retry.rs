//! Retry timing for geocoding requests.
//!
//! Attempts are numbered from 0. After a failed attempt `n` the client waits
//! `base_delay * 2^n` before trying again (100ms, 200ms, 400ms with the
//! default base), and never sleeps after the final attempt.

use std::time::Duration;

/// Largest exponent applied to the base delay.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// How many times to try one address, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per address tier. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Fixed pause before every request, regardless of outcome.
    pub request_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            request_pause: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Number of attempts to make, never less than 1.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after failed attempt `attempt` (0-based): `base_delay * 2^attempt`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.min(MAX_BACKOFF_EXPONENT))
    }

    /// Returns the same policy with `pause` slept before every request.
    #[must_use]
    pub const fn with_request_pause(mut self, pause: Duration) -> Self {
        self.request_pause = pause;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn backoff_is_non_decreasing() {
        let policy = RetryPolicy {
            max_attempts: 40,
            base_delay: Duration::from_secs(1),
            request_pause: Duration::ZERO,
        };
        let delays: Vec<Duration> = (0..40).map(|a| policy.backoff(a)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn clamps_attempts_to_one() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn sets_request_pause() {
        let policy = RetryPolicy::default().with_request_pause(Duration::from_millis(20));
        assert_eq!(policy.request_pause, Duration::from_millis(20));
        assert_eq!(policy.max_attempts, 3);
    }
}
