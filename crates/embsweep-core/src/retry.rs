//! Bounded retry with a fixed backoff.
//!
//! The policy knows nothing about the error type beyond `Display`: it counts
//! attempts, waits between them, and hands back either the value or the last
//! error. What to substitute on exhaustion is left to the caller via
//! [`Attempted::or_degrade`].

use std::fmt::Display;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Result, SweepError};

/// Maximum attempts plus the fixed wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; it must be at least 1.
    pub fn new(max_attempts: u32, backoff: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(SweepError::InvalidConfig(
                "retry policy needs at least one attempt".into(),
            ));
        }
        Ok(Self {
            max_attempts,
            backoff,
        })
    }

    /// A policy that tries once and never waits.
    #[must_use]
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Runs `op` until it succeeds or the attempts run out, blocking the
    /// thread for the backoff between failures.
    pub fn execute<T, E, F>(&self, label: &str, op: F) -> Attempted<T, E>
    where
        E: Display,
        F: FnMut(u32) -> std::result::Result<T, E>,
    {
        self.execute_with_sleep(label, op, std::thread::sleep)
    }

    /// Like [`execute`](Self::execute) but waits through `sleep`.
    ///
    /// `op` receives the 1-based attempt number. `sleep` is called between
    /// failed attempts only, never after the final one.
    pub fn execute_with_sleep<T, E, F, S>(
        &self,
        label: &str,
        mut op: F,
        mut sleep: S,
    ) -> Attempted<T, E>
    where
        E: Display,
        F: FnMut(u32) -> std::result::Result<T, E>,
        S: FnMut(Duration),
    {
        let mut attempt = 1;
        loop {
            info!("Attempt {}/{} for {}", attempt, self.max_attempts, label);

            match op(attempt) {
                Ok(value) => {
                    return Attempted::Succeeded {
                        value,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    warn!("✗ Attempt {} failed for {}: {}", attempt, label, e);
                    if attempt >= self.max_attempts {
                        return Attempted::Exhausted {
                            attempts: attempt,
                            last_error: e,
                        };
                    }
                    info!("Retrying in {:?}...", self.backoff);
                    sleep(self.backoff);
                    attempt += 1;
                }
            }
        }
    }
}

/// What a retried operation ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempted<T, E> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: E },
}

impl<T, E> Attempted<T, E> {
    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Returns the value, or builds a stand-in from the last error and the
    /// attempt count.
    pub fn or_degrade(self, degrade: impl FnOnce(&E, u32) -> T) -> T {
        match self {
            Self::Succeeded { value, .. } => value,
            Self::Exhausted {
                attempts,
                last_error,
            } => degrade(&last_error, attempts),
        }
    }

    /// Converts into a plain `Result`, dropping the attempt count.
    pub fn into_result(self) -> std::result::Result<T, E> {
        match self {
            Self::Succeeded { value, .. } => Ok(value),
            Self::Exhausted { last_error, .. } => Err(last_error),
        }
    }
}
