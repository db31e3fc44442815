//! Retry schedule for pooled command execution
//!
//! The pool retries every error kind the same way; this only decides how
//! many times and how long to wait in between.

use crate::config::PoolConfig;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 means a single attempt)
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub backoff_factor: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_backoff: Duration::from_secs(300),
        }
    }
}

impl From<&PoolConfig> for RetryPolicy {
    fn from(pool: &PoolConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_retries: pool.max_retries,
            initial_backoff: Duration::try_from_secs_f64(pool.initial_backoff_seconds)
                .unwrap_or(defaults.initial_backoff),
            backoff_factor: pool.backoff_factor,
            max_backoff: Duration::try_from_secs_f64(pool.max_backoff_seconds)
                .unwrap_or(defaults.max_backoff),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// A policy that tries exactly once.
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    pub fn with_backoff(mut self, initial: Duration, factor: f64, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.backoff_factor = factor;
        self.max_backoff = max;
        self
    }

    /// Total attempts including the first.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sleep before attempt number `attempt` (0-based), capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.backoff_factor.powi(exponent);
        let max = self.max_backoff.as_secs_f64();
        if !secs.is_finite() || secs >= max {
            return self.max_backoff;
        }
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(self.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn schedule_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(9), Duration::from_secs(300));
        assert_eq!(policy.backoff(u32::MAX), Duration::from_secs(300));
    }

    #[test]
    fn attempts_counts_first_try() {
        assert_eq!(RetryPolicy::new(2).attempts(), 3);
        assert_eq!(RetryPolicy::no_retry().attempts(), 1);
    }
}
