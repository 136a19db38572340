//! Bounded retry policy and executor for external calls.
//!
//! A [`RetryPolicy`] is a plain value: how many attempts to make and how long
//! to wait before each one after the first. [`execute`] runs a single call
//! under a policy and returns either the call's success value or a
//! [`RetryExhausted`] carrying the last failure.

use std::fmt::Display;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `min(initial * 2^(k-2), max)` before attempt `k`.
    Exponential { initial: Duration, max: Duration },
    Fixed(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Policy used for every news and indicator fetch.
    pub fn fetch_default() -> Self {
        Self {
            max_attempts: 7,
            backoff: Backoff::Exponential {
                initial: Duration::from_millis(1000),
                max: Duration::from_millis(10_000),
            },
        }
    }

    /// Policy used for each generative classification request.
    pub fn generative_default() -> Self {
        Self {
            max_attempts: 4,
            backoff: Backoff::Fixed(Duration::from_millis(2000)),
        }
    }

    /// Delay to wait before the given 1-based attempt. The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let exponent = (attempt - 2).min(31);
                initial
                    .checked_mul(1u32 << exponent)
                    .map_or(max, |delay| delay.min(max))
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fetch_default()
    }
}

/// Blocks the current thread between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Every attempt allowed by the policy failed.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `call` until it succeeds or `policy.max_attempts` attempts have failed.
///
/// `call` receives the 1-based attempt number. A policy with `max_attempts == 0`
/// is treated as a single attempt.
pub fn execute<T, E, F>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    label: &str,
    mut call: F,
) -> Result<T, RetryExhausted<E>>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match call(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: e,
                });
            }
            Err(e) => {
                let delay = policy.delay_before(attempt + 1);
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    label, attempt, max_attempts, e, delay
                );
                sleeper.sleep(delay);
                attempt += 1;
            }
        }
    }
}
