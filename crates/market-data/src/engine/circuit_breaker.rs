//! Per-source circuit breaker.
//!
//! A source that keeps timing out, rate limiting or refusing connections is
//! skipped for a while so it cannot slow down every cascade that ranks it.
//! The circuit has three states:
//!
//! - **Closed**: calls go through.
//! - **Open**: the source is skipped.
//! - **HalfOpen**: the recovery window elapsed; calls go through on probation.
//!
//! State is in-memory, shared by all requests of the process.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::models::SourceId;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Successful calls needed to close the circuit from HalfOpen.
const HALF_OPEN_SUCCESS_THRESHOLD: u32 = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    /// Consecutive penalized failures.
    failure_count: u32,
    half_open_successes: u32,
    last_failure: Option<Instant>,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            half_open_successes: 0,
            last_failure: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Penalized failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long an open circuit skips the source.
    pub recovery_timeout: Duration,
    /// Successes needed to close from HalfOpen.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_success_threshold: HALF_OPEN_SUCCESS_THRESHOLD,
        }
    }
}

/// Thread-safe breaker tracking one circuit per [`SourceId`].
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<SourceId, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Lock the circuits, recovering from poison.
    ///
    /// A poisoned lock can only leave a circuit slightly out of date.
    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<SourceId, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether `source` may be called now.
    ///
    /// Moves an open circuit to HalfOpen once the recovery window elapsed.
    pub fn is_allowed(&self, source: SourceId) -> bool {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(source).or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let recovered = circuit
                    .last_failure
                    .is_some_and(|at| at.elapsed() >= self.config.recovery_timeout);
                if recovered {
                    info!(
                        "Circuit breaker: transitioning '{}' from Open to HalfOpen",
                        source
                    );
                    circuit.state = CircuitState::HalfOpen;
                    circuit.half_open_successes = 0;
                }
                recovered
            }
        }
    }

    pub fn record_success(&self, source: SourceId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(source).or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed => {
                circuit.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                circuit.half_open_successes += 1;
                debug!(
                    "Circuit breaker: success for '{}' in HalfOpen ({}/{})",
                    source, circuit.half_open_successes, self.config.half_open_success_threshold
                );

                if circuit.half_open_successes >= self.config.half_open_success_threshold {
                    info!(
                        "Circuit breaker: closing circuit for '{}' after {} successes",
                        source, circuit.half_open_successes
                    );
                    *circuit = Circuit::new();
                }
            }
            CircuitState::Open => {
                debug!(
                    "Circuit breaker: unexpected success for '{}' in Open state",
                    source
                );
            }
        }
    }

    /// Any failure in HalfOpen reopens the circuit immediately.
    pub fn record_failure(&self, source: SourceId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(source).or_insert_with(Circuit::new);

        circuit.failure_count += 1;
        circuit.last_failure = Some(Instant::now());

        match circuit.state {
            CircuitState::Closed if circuit.failure_count >= self.config.failure_threshold => {
                info!(
                    "Circuit breaker: opening circuit for '{}' after {} failures",
                    source, circuit.failure_count
                );
                circuit.state = CircuitState::Open;
            }
            CircuitState::Closed => {
                debug!(
                    "Circuit breaker: failure for '{}' ({}/{})",
                    source, circuit.failure_count, self.config.failure_threshold
                );
            }
            CircuitState::HalfOpen => {
                info!(
                    "Circuit breaker: reopening circuit for '{}' after failure in HalfOpen",
                    source
                );
                circuit.state = CircuitState::Open;
                circuit.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self, source: SourceId) -> CircuitState {
        self.lock_circuits()
            .get(&source)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn failure_count(&self, source: SourceId) -> u32 {
        self.lock_circuits()
            .get(&source)
            .map(|c| c.failure_count)
            .unwrap_or(0)
    }

    /// Close the circuit for `source` and forget its failures.
    pub fn reset(&self, source: SourceId) {
        if self.lock_circuits().remove(&source).is_some() {
            info!("Circuit breaker: manually resetting circuit for '{}'", source);
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
