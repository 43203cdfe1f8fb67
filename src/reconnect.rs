//! Exponential reconnect backoff with jitter.
//!
//! Delays start at `initial_ms`, double after each failed attempt, and stop
//! growing at `max_ms`. Each delay is jittered down by up to a quarter so a
//! fleet of views does not reconnect in lockstep after a server restart.

#[cfg(test)]
#[path = "reconnect_test.rs"]
mod reconnect_test;

use std::time::Duration;

use rand::Rng;

use crate::config::BackoffConfig;

#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current_ms: u64,
    attempts: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, current_ms: config.initial_ms, attempts: 0 }
    }

    /// Failed attempts since the last reset.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Un-jittered delay the next call to [`Backoff::next_delay`] is based on.
    #[must_use]
    pub fn current_ms(&self) -> u64 {
        self.current_ms
    }

    /// Delay before the next attempt, then grow the base delay.
    pub fn next_delay(&mut self) -> Duration {
        self.next_delay_with(&mut rand::rng())
    }

    pub fn next_delay_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Duration {
        let base = self.current_ms;
        let jitter = rng.random_range(0..=base / 4);
        self.current_ms = base.saturating_mul(2).min(self.config.max_ms);
        self.attempts = self.attempts.saturating_add(1);
        Duration::from_millis(base - jitter)
    }

    /// Back to the initial delay after a successful connect.
    pub fn reset(&mut self) {
        self.current_ms = self.config.initial_ms;
        self.attempts = 0;
    }
}
