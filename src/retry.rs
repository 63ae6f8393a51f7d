use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RetryConfigError {
    #[error("initial retry delay must be greater than zero")]
    ZeroInitialDelay,
    #[error("initial retry delay {initial:?} exceeds maximum {max:?}")]
    InitialExceedsMax { initial: Duration, max: Duration },
    #[error("backoff factor must be a finite number, got {0}")]
    NonFiniteFactor(f64),
}

/// Hands out the delay to wait before the next retry attempt.
///
/// The first call to [`RetryDelay::next_delay`] after creation or
/// [`RetryDelay::reset`] returns the initial delay. Each following call
/// returns the previous value multiplied by the backoff factor, clamped to
/// the maximum. A factor of 1 or less yields a constant sequence.
#[derive(Debug, Clone)]
pub struct RetryDelay {
    initial_ns: f64,
    max_ns: f64,
    factor: f64,
    current_ns: f64,
}

impl RetryDelay {
    pub fn new(initial: Duration, max: Duration, factor: f64) -> Result<Self, RetryConfigError> {
        if initial.is_zero() {
            return Err(RetryConfigError::ZeroInitialDelay);
        }
        if initial > max {
            return Err(RetryConfigError::InitialExceedsMax { initial, max });
        }
        if !factor.is_finite() {
            return Err(RetryConfigError::NonFiniteFactor(factor));
        }

        let initial_ns = initial.as_nanos() as f64;
        Ok(Self {
            initial_ns,
            max_ns: max.as_nanos() as f64,
            factor,
            current_ns: initial_ns,
        })
    }

    pub fn from_millis(initial_ms: u64, max_ms: u64, factor: f64) -> Result<Self, RetryConfigError> {
        Self::new(
            Duration::from_millis(initial_ms),
            Duration::from_millis(max_ms),
            factor,
        )
    }

    /// Returns the delay for the upcoming wait and advances the backoff.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current();
        if self.current_ns < self.max_ns && self.factor > 1.0 {
            self.current_ns = (self.current_ns * self.factor).min(self.max_ns);
        }
        delay
    }

    /// Starts the sequence over from the initial delay.
    pub fn reset(&mut self) {
        self.current_ns = self.initial_ns;
    }

    /// The delay the next call to `next_delay` will return.
    pub fn current(&self) -> Duration {
        to_duration(self.current_ns)
    }

    pub fn initial(&self) -> Duration {
        to_duration(self.initial_ns)
    }

    pub fn max(&self) -> Duration {
        to_duration(self.max_ns)
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

/// One backoff shared by every task that retries the same kind of operation.
///
/// A success reported through any handle resets the delay all handles see.
#[derive(Debug, Clone)]
pub struct SharedRetryDelay {
    inner: Arc<Mutex<RetryDelay>>,
}

impl SharedRetryDelay {
    pub fn new(delay: RetryDelay) -> Self {
        Self {
            inner: Arc::new(Mutex::new(delay)),
        }
    }

    pub fn next_delay(&self) -> Duration {
        self.lock().next_delay()
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn current(&self) -> Duration {
        self.lock().current()
    }

    fn lock(&self) -> MutexGuard<'_, RetryDelay> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<RetryDelay> for SharedRetryDelay {
    fn from(delay: RetryDelay) -> Self {
        Self::new(delay)
    }
}

fn to_duration(nanos: f64) -> Duration {
    Duration::from_nanos(nanos.round() as u64)
}
