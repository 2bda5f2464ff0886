//! store::retry
//!
//! Bounded retry with uniformly jittered waits.
//!
//! # State Machine
//!
//! ```text
//!              success
//! Attempting ──────────► Succeeded
//!     │  ▲
//!     │  │ wake
//!     │  └──────── Sleeping
//!     │ failure,      ▲
//!     │ budget left   │
//!     ├───────────────┘
//!     │ failure, budget spent
//!     └──────────► Exhausted
//! ```
//!
//! The wait before each retry is drawn uniformly from `[0, max_wait]`, so
//! jobs that collided once are unlikely to collide again in lockstep.
//!
//! Both the clock ([`Sleeper`]) and the random source (any
//! [`rand::RngCore`]) are injected, which keeps attempt counts and wait
//! bounds testable without real sleeping.

use std::time::Duration;

use rand::{Rng, RngCore};

use crate::core::config::{ConfigError, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_WAIT_SECONDS};

/// Something that can pause the current thread.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Real sleeping via `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested sleeps instead of sleeping.
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    pub sleeps: Vec<Duration>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}

/// How many times to try and how long to wait at most between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    max_wait: Duration,
}

impl RetryPolicy {
    /// Create a policy.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` if `max_attempts` is zero.
    pub fn new(max_attempts: u32, max_wait: Duration) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            max_wait,
        })
    }

    /// Try once, never sleep.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            max_wait: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// A wait drawn uniformly from `[0, max_wait]`.
    pub fn jitter(&self, rng: &mut dyn RngCore) -> Duration {
        let upper = self.max_wait.as_secs_f64();
        if upper <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(rng.random_range(0.0..=upper)).min(self.max_wait)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_wait: Duration::from_secs_f64(DEFAULT_MAX_WAIT_SECONDS),
        }
    }
}

/// Where a retry loop stands. Attempts are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting { attempt: u32 },
    Sleeping { attempt: u32, delay: Duration },
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
}

/// The retry state machine, advanced explicitly by its driver.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    state: RetryState,
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: RetryState::Attempting { attempt: 1 },
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// The attempt in progress, or the last one made.
    pub fn attempt(&self) -> u32 {
        match self.state {
            RetryState::Attempting { attempt } | RetryState::Sleeping { attempt, .. } => attempt,
            RetryState::Succeeded { attempts } | RetryState::Exhausted { attempts } => attempts,
        }
    }

    /// The current attempt succeeded.
    pub fn succeed(&mut self) -> RetryState {
        if let RetryState::Attempting { attempt } = self.state {
            self.state = RetryState::Succeeded { attempts: attempt };
        }
        self.state
    }

    /// The current attempt failed: sleep if budget remains, else give up.
    pub fn fail(&mut self, rng: &mut dyn RngCore) -> RetryState {
        if let RetryState::Attempting { attempt } = self.state {
            self.state = if attempt >= self.policy.max_attempts {
                RetryState::Exhausted { attempts: attempt }
            } else {
                RetryState::Sleeping {
                    attempt,
                    delay: self.policy.jitter(rng),
                }
            };
        }
        self.state
    }

    /// The sleep finished; start the next attempt.
    pub fn wake(&mut self) -> RetryState {
        if let RetryState::Sleeping { attempt, .. } = self.state {
            self.state = RetryState::Attempting {
                attempt: attempt + 1,
            };
        }
        self.state
    }
}

/// Every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Attempts made.
    pub attempts: u32,
    /// Error from the final attempt.
    pub last: E,
}

/// Run `op` until it succeeds or the policy's budget is spent.
///
/// `op` receives the 1-based attempt number.
pub fn retry<T, E>(
    policy: RetryPolicy,
    sleeper: &mut dyn Sleeper,
    rng: &mut dyn RngCore,
    mut op: impl FnMut(u32) -> Result<T, E>,
) -> Result<T, RetryExhausted<E>> {
    let mut backoff = Backoff::new(policy);
    loop {
        let attempt = backoff.attempt();
        match op(attempt) {
            Ok(value) => {
                backoff.succeed();
                return Ok(value);
            }
            Err(last) => match backoff.fail(rng) {
                RetryState::Sleeping { delay, .. } => {
                    sleeper.sleep(delay);
                    backoff.wake();
                }
                _ => return Err(RetryExhausted { attempts: attempt, last }),
            },
        }
    }
}
