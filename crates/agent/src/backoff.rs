// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry delays for failing remote targets.
//!
//! Delays double from one second up to a cap, then get jittered. The
//! failure counter is keyed by target: a failure against a different
//! target starts a fresh sequence instead of inheriting the old one.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// First retry delay.
pub const BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for the jitter percentage.
pub const MAX_JITTER_PERCENT: u32 = 90;

/// Target name used when a failure carries none.
const DEFAULT_TARGET: &str = "remote";

/// Cap and jitter applied to every computed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_backoff: Duration,
    pub jitter_percent: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { max_backoff: Duration::from_secs(60), jitter_percent: 20 }
    }
}

/// Consecutive failure count against the most recent failing target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    failure_count: u32,
    last_target: String,
}

impl RetryState {
    /// Record one failure against `target` and return the new count.
    pub fn record_failure(&mut self, target: &str) -> u32 {
        let target = if target.is_empty() { DEFAULT_TARGET } else { target };
        if self.last_target != target {
            if !self.last_target.is_empty() {
                self.failure_count = 0;
            }
            self.last_target = target.to_owned();
        }
        self.failure_count = self.failure_count.saturating_add(1);
        self.failure_count
    }

    pub fn reset(&mut self) {
        self.failure_count = 0;
        self.last_target.clear();
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn last_target(&self) -> &str {
        &self.last_target
    }
}

/// Un-jittered delay for the `retry_count`-th consecutive failure.
///
/// `retry_count < 1` counts as 1 and a zero cap counts as one second.
pub fn base_delay(retry_count: u32, max_backoff: Duration) -> Duration {
    let retry_count = retry_count.max(1);
    let max_backoff = if max_backoff.is_zero() { BASE_DELAY } else { max_backoff };

    let mut delay = BASE_DELAY;
    for _ in 1..retry_count {
        if delay >= max_backoff {
            return max_backoff;
        }
        delay = delay.saturating_mul(2);
    }
    delay.min(max_backoff)
}

/// Spread `base` uniformly over `base * (1 ± p/100)`.
///
/// `sample` is a uniform draw from `[0, 1)`; `jitter_percent` is clamped to
/// [`MAX_JITTER_PERCENT`].
pub fn apply_jitter(base: Duration, jitter_percent: u32, sample: f64) -> Duration {
    if base.is_zero() || jitter_percent == 0 {
        return base;
    }
    let fraction = f64::from(jitter_percent.min(MAX_JITTER_PERCENT)) / 100.0;
    let base_secs = base.as_secs_f64();
    let low = base_secs * (1.0 - fraction);
    let high = base_secs * (1.0 + fraction);
    let jittered = low + sample.clamp(0.0, 1.0) * (high - low);
    if jittered <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(jittered)
}

/// Retry-delay generator owned by a single sync loop.
pub struct Backoff {
    policy: BackoffPolicy,
    retry: RetryState,
    rng: StdRng,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_os_rng())
    }

    pub fn with_rng(policy: BackoffPolicy, rng: StdRng) -> Self {
        Self { policy, retry: RetryState::default(), rng }
    }

    /// Record a failure against `target` and compute how long to wait.
    pub fn next_delay(&mut self, target: &str) -> Duration {
        let count = self.retry.record_failure(target);
        let base = base_delay(count, self.policy.max_backoff);
        apply_jitter(base, self.policy.jitter_percent, self.rng.random::<f64>())
    }

    pub fn reset(&mut self) {
        self.retry.reset();
    }

    pub fn retry_state(&self) -> &RetryState {
        &self.retry
    }

    pub fn policy(&self) -> BackoffPolicy {
        self.policy
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
