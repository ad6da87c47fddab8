//! Exponential backoff without jitter.

use std::time::Duration;

/// Delay to wait after failed attempt `attempt` (1-based) before the next one.
///
/// Computes `initial_secs * multiplier^(attempt - 1)`. Attempt 0, and any
/// negative or non-finite input, yields a zero delay; overflow saturates.
pub fn calculate_backoff(attempt: u32, initial_secs: f64, multiplier: f64) -> Duration {
    if attempt == 0 || !initial_secs.is_finite() || initial_secs <= 0.0 {
        return Duration::ZERO;
    }
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Duration::ZERO;
    }

    let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
    let secs = initial_secs * multiplier.powi(exponent);
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Iterator over the successive delays of an exponential schedule.
#[derive(Debug, Clone)]
pub struct Backoff {
    attempt: u32,
    initial_secs: f64,
    multiplier: f64,
}

impl Backoff {
    pub fn new(initial_secs: f64, multiplier: f64) -> Self {
        Self {
            attempt: 0,
            initial_secs,
            multiplier,
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        self.attempt = self.attempt.saturating_add(1);
        Some(calculate_backoff(self.attempt, self.initial_secs, self.multiplier))
    }
}
