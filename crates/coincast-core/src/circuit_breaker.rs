use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Runtime circuit state for provider upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Circuit breaker thresholds and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
enum Gate {
    Closed { consecutive_failures: u32 },
    Open { since: Instant },
    HalfOpen,
}

/// Thread-safe circuit breaker for provider network requests.
///
/// Opens after `failure_threshold` consecutive failures, blocks calls
/// for `open_timeout`, then lets a single probe through (half-open). A
/// probe failure re-opens immediately; a success closes the circuit.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    gate: Mutex<Gate>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            gate: Mutex::new(Gate::Closed {
                consecutive_failures: 0,
            }),
        }
    }

    pub fn allow_request(&self) -> bool {
        let mut gate = self.gate.lock().expect("circuit gate is not poisoned");
        match *gate {
            Gate::Closed { .. } | Gate::HalfOpen => true,
            Gate::Open { since } => {
                if since.elapsed() >= self.config.open_timeout {
                    *gate = Gate::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut gate = self.gate.lock().expect("circuit gate is not poisoned");
        *gate = Gate::Closed {
            consecutive_failures: 0,
        };
    }

    pub fn record_failure(&self) {
        let mut gate = self.gate.lock().expect("circuit gate is not poisoned");
        *gate = match *gate {
            Gate::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures.saturating_add(1);
                if failures >= self.config.failure_threshold {
                    Gate::Open {
                        since: Instant::now(),
                    }
                } else {
                    Gate::Closed {
                        consecutive_failures: failures,
                    }
                }
            }
            Gate::HalfOpen | Gate::Open { .. } => Gate::Open {
                since: Instant::now(),
            },
        };
    }

    pub fn state(&self) -> CircuitState {
        let gate = self.gate.lock().expect("circuit gate is not poisoned");
        match *gate {
            Gate::Closed { .. } => CircuitState::Closed,
            Gate::Open { .. } => CircuitState::Open,
            Gate::HalfOpen => CircuitState::HalfOpen,
        }
    }
}
