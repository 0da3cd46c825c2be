// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff between broker reconnect attempts.
//!
//! The timer is a pure state machine over the current interval; callers do
//! the sleeping.

use std::time::Duration;

/// Backoff parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// First interval after backoff is enabled or reset
    pub initial_interval: Duration,
    /// Growth factor applied after each interval
    pub multiplier: f64,
    /// Upper bound for any interval
    pub max_interval: Duration,
    /// Interval returned while backoff is disabled
    pub default_interval: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(100),
            multiplier: 2.0,
            max_interval: Duration::from_secs(5),
            default_interval: Duration::from_secs(5),
        }
    }
}

impl BackoffConfig {
    /// Millisecond-scale intervals for tests
    pub fn for_testing() -> Self {
        Self {
            initial_interval: Duration::from_millis(1),
            multiplier: 2.0,
            max_interval: Duration::from_millis(8),
            default_interval: Duration::from_millis(8),
        }
    }
}

/// Tracks the next wait between attempts
#[derive(Debug, Clone)]
pub struct BackoffTimer {
    config: BackoffConfig,
    enabled: bool,
    next: Duration,
}

impl BackoffTimer {
    /// New timer, with backoff disabled
    pub fn new(config: BackoffConfig) -> Self {
        let next = config.initial_interval;
        Self {
            config,
            enabled: false,
            next,
        }
    }

    /// Start growing intervals from the initial one. No-op when already enabled.
    pub fn enable_backoff(&mut self) {
        if !self.enabled {
            self.enabled = true;
            self.next = self.config.initial_interval;
        }
    }

    /// Fall back to the default interval
    pub fn disable_backoff(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Restart the sequence at the initial interval
    pub fn reset(&mut self) {
        self.next = self.config.initial_interval;
    }

    /// Interval to wait now, advancing the sequence
    pub fn next_interval(&mut self) -> Duration {
        if !self.enabled {
            return self.config.default_interval;
        }
        let max = self.config.max_interval;
        let current = self.next.min(max);
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.config.multiplier)
            .map(|grown| grown.min(max))
            .unwrap_or(max);
        current
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
