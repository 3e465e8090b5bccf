//! Retry policy.
//!
//! # Responsibilities
//! - Bound the number of attempts of a polled or retried call
//! - Compute the delay before the next attempt
//!
//! # Design Decisions
//! - Attempt count is the only ceiling; wall-clock time is
//!   `max_attempts × delay` plus whatever each attempt takes
//! - No delay before the first attempt, none after the last

use std::time::Duration;

use crate::config::schema::{BackoffKind, PollingConfig, SimulationConfig};
use crate::resilience::backoff::{calculate_backoff, calculate_linear};

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    /// Same delay every time.
    Fixed(Duration),
    /// `base * attempt`.
    Linear(Duration),
    /// Doubling from `base`, capped at `max`, with jitter.
    Exponential { base: Duration, max: Duration },
}

/// Maximum attempts plus delay schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Delay,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay: Delay::Fixed(delay),
        }
    }

    pub fn from_polling(config: &PollingConfig) -> Self {
        let delay = match config.backoff {
            BackoffKind::Fixed => Delay::Fixed(Duration::from_millis(config.interval_ms)),
            BackoffKind::Exponential => Delay::Exponential {
                base: Duration::from_millis(config.interval_ms),
                max: Duration::from_millis(config.max_delay_ms),
            },
        };
        Self {
            max_attempts: config.max_attempts,
            delay,
        }
    }

    pub fn from_simulation(config: &SimulationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: Delay::Linear(Duration::from_millis(config.base_delay_ms)),
        }
    }

    /// Delay to wait after `completed` attempts (1-based), or `None` once the
    /// ceiling is reached.
    pub fn delay_after(&self, completed: u32) -> Option<Duration> {
        if completed >= self.max_attempts {
            return None;
        }
        Some(match self.delay {
            Delay::Fixed(d) => d,
            Delay::Linear(base) => calculate_linear(completed, base.as_millis() as u64),
            Delay::Exponential { base, max } => {
                calculate_backoff(completed, base.as_millis() as u64, max.as_millis() as u64)
            }
        })
    }

    /// Worst-case time spent sleeping, excluding the attempts themselves.
    pub fn total_delay_bound(&self) -> Duration {
        (1..self.max_attempts)
            .map(|n| match self.delay {
                Delay::Fixed(d) => d,
                Delay::Linear(base) => base.saturating_mul(n),
                // Jitter adds at most 10%.
                Delay::Exponential { base, max } => {
                    let d = base.saturating_mul(2u32.saturating_pow(n - 1)).min(max);
                    d + d / 10
                }
            })
            .sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_polling(&PollingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policy_stops_at_ceiling() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(500));
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_after(3), None);
        assert_eq!(policy.total_delay_bound(), Duration::from_millis(1000));
    }

    #[test]
    fn test_default_matches_polling_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.delay, Delay::Fixed(Duration::from_secs(2)));
        assert_eq!(policy.total_delay_bound(), Duration::from_secs(18));
    }

    #[test]
    fn test_simulation_policy_is_linear() {
        let policy = RetryPolicy::from_simulation(&SimulationConfig::default());
        assert_eq!(policy.delay_after(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_after(3), None);
    }

    #[test]
    fn test_exponential_is_capped() {
        let config = PollingConfig {
            max_attempts: 8,
            interval_ms: 100,
            backoff: BackoffKind::Exponential,
            max_delay_ms: 400,
        };
        let policy = RetryPolicy::from_polling(&config);
        let d = policy.delay_after(6).unwrap();
        assert!(d >= Duration::from_millis(400) && d < Duration::from_millis(440));
    }
}
