//! Circuit breaker for upstream text-generation protection

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,   // Normal operation
    Open,     // Failing, reject requests
    HalfOpen, // Testing if service recovered
}

#[derive(Debug)]
struct BreakerEntry {
    state: BreakerState,
    failure_count: usize,
    opened_at: Option<Instant>,
    /// Start of the single trial call admitted while half-open
    trial_started: Option<Instant>,
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&crate::config::BreakerConfig> for CircuitBreakerConfig {
    fn from(config: &crate::config::BreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold.max(1),
            reset_timeout: config.reset_timeout(),
        }
    }
}

/// Breaker guarding a single upstream
pub struct CircuitBreaker {
    entry: Mutex<BreakerEntry>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            entry: Mutex::new(BreakerEntry {
                state: BreakerState::Closed,
                failure_count: 0,
                opened_at: None,
                trial_started: None,
            }),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerEntry> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether calls should be rejected right now
    ///
    /// An open breaker moves to half-open once the reset timeout elapses.
    /// While half-open only one trial call is admitted at a time; a trial
    /// that never reports back is replaced after another reset timeout.
    pub fn is_open(&self) -> bool {
        let mut entry = self.lock();
        let now = Instant::now();

        match entry.state {
            BreakerState::Closed => false,
            BreakerState::HalfOpen => match entry.trial_started {
                Some(started) if now.duration_since(started) < self.config.reset_timeout => true,
                _ => {
                    entry.trial_started = Some(now);
                    false
                }
            },
            BreakerState::Open => match entry.opened_at {
                Some(opened_at) if now.duration_since(opened_at) >= self.config.reset_timeout => {
                    entry.state = BreakerState::HalfOpen;
                    entry.trial_started = Some(now);
                    false
                }
                _ => true,
            },
        }
    }

    pub fn mark_success(&self) {
        let mut entry = self.lock();
        entry.state = BreakerState::Closed;
        entry.failure_count = 0;
        entry.opened_at = None;
        entry.trial_started = None;
    }

    pub fn mark_failure(&self) {
        let mut entry = self.lock();
        entry.failure_count += 1;
        entry.trial_started = None;

        // A failed half-open trial reopens immediately
        if entry.state == BreakerState::HalfOpen
            || entry.failure_count >= self.config.failure_threshold
        {
            entry.state = BreakerState::Open;
            entry.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn failure_count(&self) -> usize {
        self.lock().failure_count
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
