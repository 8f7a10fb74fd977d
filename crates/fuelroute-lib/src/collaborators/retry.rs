//! Exponential backoff with jitter for calls to external services.
//!
//! Only transient failures ([`crate::Error::is_transient`]) are retried; everything
//! else is returned immediately.

use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

use crate::error::Result;

/// How often and how patiently to retry a collaborator call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
            jitter_ratio: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Policy used for routing calls, which start from a longer delay.
    pub fn routing() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            ..Self::default()
        }
    }

    /// Delay after failed attempt `attempt` (1-based), before jitter.
    ///
    /// Grows by `multiplier` per attempt and never exceeds `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_delay.max(Duration::from_millis(1));
        let growth = self
            .multiplier
            .max(1)
            .saturating_pow(attempt.saturating_sub(1));
        base.saturating_mul(growth).min(self.max_delay.max(base))
    }

    /// [`Self::backoff`] plus up to `jitter_ratio` of it again, still capped at
    /// `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.backoff(attempt);
        let ratio = if self.jitter_ratio.is_finite() {
            self.jitter_ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if ratio <= 0.0 {
            return delay;
        }
        let jitter = delay.mul_f64(rand::rng().random_range(0.0..=ratio));
        (delay + jitter).min(self.max_delay.max(delay))
    }

    /// Run `operation`, retrying transient failures with backoff.
    pub fn run<T, F>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure; retrying"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        error!(operation, attempts = attempt, error = %err, "giving up after retries");
                    }
                    return Err(err);
                }
            }
        }
    }
}
