//! Retrying call executor.
//!
//! # Responsibilities
//! - Invoke a fallible operation up to `max_attempts` times
//! - Wait `initial_delay * multiplier^(n-1)` after the n-th failure
//! - Stop early on success or on a failure the predicate rejects
//!
//! The last failure is handed back untouched, so callers see exactly what
//! the final attempt produced.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::{calculate_backoff, Backoff};

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Seconds to wait after the first failure.
    pub initial_delay_secs: f64,
    /// Growth factor applied to the delay after each failure.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_secs: 0.8,
            backoff_multiplier: 2.0,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay_secs: config.initial_delay_secs,
            backoff_multiplier: config.backoff_multiplier,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay_secs: f64, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay_secs,
            backoff_multiplier,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(1, 0.0, 1.0)
    }

    /// Effective attempt budget; zero is treated as a single attempt.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay observed before attempt number `attempt` (so `delay_before(2)`
    /// is the initial delay). The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        calculate_backoff(
            attempt.saturating_sub(1),
            self.initial_delay_secs,
            self.backoff_multiplier,
        )
    }

    /// All inter-attempt delays of this policy, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let gaps = self.attempts() - 1;
        Backoff::new(self.initial_delay_secs, self.backoff_multiplier).take(gaps as usize)
    }

    /// Restrict retries to failures accepted by `retryable`.
    pub fn retry_if<P>(self, retryable: P) -> Retry<P> {
        Retry {
            policy: self,
            retryable,
        }
    }

    /// Run `op`, retrying on any failure.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.retry_if(|_: &E| true).run(op).await
    }

    /// Blocking variant of [`RetryPolicy::run`]; sleeps the calling thread.
    pub fn run_blocking<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.retry_if(|_: &E| true).run_blocking(op)
    }
}

/// A [`RetryPolicy`] paired with a predicate selecting retryable failures.
#[derive(Debug, Clone, Copy)]
pub struct Retry<P> {
    policy: RetryPolicy,
    retryable: P,
}

impl<P> Retry<P> {
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget runs out.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        P: Fn(&E) -> bool,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt >= max_attempts || !(self.retryable)(&error) {
                return Err(error);
            }

            let delay = self.policy.delay_before(attempt + 1);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Same contract as [`Retry::run`] for synchronous operations.
    pub fn run_blocking<T, E, F>(&self, mut op: F) -> Result<T, E>
    where
        P: Fn(&E) -> bool,
        F: FnMut() -> Result<T, E>,
    {
        let max_attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match op() {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt >= max_attempts || !(self.retryable)(&error) {
                return Err(error);
            }

            let delay = self.policy.delay_before(attempt + 1);
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }
    }
}
