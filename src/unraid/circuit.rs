//! Circuit breaker for the connection pool
//!
//! Two states only:
//! - Closed: commands are attempted; failures are timestamped
//! - Open: every attempt fails fast until the reset deadline passes
//!
//! The breaker opens when `threshold` failures land inside the sliding
//! `window`. It closes again, with its failure history cleared, once the
//! clock moves past `opened_at + reset_after`.

use crate::config::PoolConfig;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failures inside `window` that open the breaker
    pub threshold: usize,

    /// Sliding window for counting failures
    pub window: Duration,

    /// How long the breaker stays open
    pub reset_after: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            window: Duration::from_secs(60),
            reset_after: Duration::from_secs(300),
        }
    }
}

impl From<&PoolConfig> for CircuitBreakerConfig {
    fn from(pool: &PoolConfig) -> Self {
        Self {
            threshold: pool.circuit_breaker_threshold,
            window: Duration::from_secs(pool.circuit_breaker_window_seconds),
            reset_after: Duration::try_from_secs_f64(pool.max_backoff_seconds)
                .unwrap_or(Duration::from_secs(300)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open { reset_at: Instant },
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open { .. } => write!(f, "open"),
        }
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    recent_errors: Vec<Instant>,
    state: CircuitState,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            recent_errors: Vec::new(),
            state: CircuitState::Closed,
        }
    }

    /// Timestamp one failure.
    pub fn record_error(&mut self, now: Instant) {
        self.recent_errors.push(now);
    }

    /// Evaluate the breaker at `now`, transitioning if due.
    ///
    /// A closed breaker prunes failures older than the window and opens if
    /// enough remain. An open breaker closes once `now` is past its deadline.
    pub fn is_open(&mut self, host: &str, now: Instant) -> bool {
        match self.state {
            CircuitState::Open { reset_at } => {
                if now > reset_at {
                    self.state = CircuitState::Closed;
                    self.recent_errors.clear();
                    info!(host = %host, "Circuit breaker reset");
                    false
                } else {
                    true
                }
            }
            CircuitState::Closed => {
                let window = self.config.window;
                self.recent_errors
                    .retain(|at| now.saturating_duration_since(*at) < window);

                if self.recent_errors.len() >= self.config.threshold {
                    let reset_at = now + self.config.reset_after;
                    self.state = CircuitState::Open { reset_at };
                    warn!(
                        host = %host,
                        errors = self.recent_errors.len(),
                        window_secs = window.as_secs(),
                        reset_in_secs = self.config.reset_after.as_secs(),
                        "Circuit breaker opened"
                    );
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Failures currently held in the window.
    pub fn recent_errors(&self) -> usize {
        self.recent_errors.len()
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
