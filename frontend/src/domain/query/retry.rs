//! Backoff gating for automatic revalidation of failing queries.
//!
//! Failures are always surfaced to subscribers; this policy only decides when
//! the next automatic trigger (mount, focus, reconnect) may fetch again.

use std::time::Duration;

use rand::Rng;

/// Capped exponential backoff with a maximum number of consecutive attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures after which automatic triggers stop fetching.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound for the un-jittered delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Whether another automatic attempt is allowed after `failures`
    /// consecutive failures.
    #[must_use]
    pub const fn allows_attempt(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }

    /// Un-jittered delay after `failures` consecutive failures.
    ///
    /// Doubles per failure starting at `initial_backoff`, capped at
    /// `max_backoff`.
    #[must_use]
    pub fn base_delay(&self, failures: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(failures.saturating_sub(1));
        let base_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay derived from the exponential base delay.
    fn jittered_delay(&self, base: Duration, failures: u32) -> Duration;
}

/// Adds up to a quarter of the base delay, drawn from the thread RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, _failures: u32) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = (base_ms / 4).max(1);
        let extra = rand::thread_rng().gen_range(0..=max_extra);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}

/// Uses the base delay unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _failures: u32) -> Duration {
        base
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1_000)]
    #[case(2, 2_000)]
    #[case(3, 4_000)]
    #[case(5, 16_000)]
    #[case(6, 30_000)]
    #[case(40, 30_000)]
    fn base_delay_doubles_until_capped(#[case] failures: u32, #[case] expected_ms: u64) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay(failures), Duration::from_millis(expected_ms));
    }

    #[rstest]
    #[case(0, true)]
    #[case(4, true)]
    #[case(5, false)]
    #[case(9, false)]
    fn attempts_stop_at_the_limit(#[case] failures: u32, #[case] allowed: bool) {
        assert_eq!(RetryPolicy::default().allows_attempt(failures), allowed);
    }

    #[test]
    fn random_jitter_stays_within_a_quarter() {
        let base = Duration::from_millis(800);
        for failures in 1..50 {
            let delay = RandomJitter.jittered_delay(base, failures);
            assert!(delay >= base);
            assert!(delay <= Duration::from_millis(1_000));
        }
    }

    #[test]
    fn no_jitter_is_identity() {
        let base = Duration::from_secs(3);
        assert_eq!(NoJitter.jittered_delay(base, 2), base);
    }
}
