//! Resolution engine.
//!
//! This module orchestrates the source adapters:
//! - Ranked cascade with early stop
//! - Per-call timeouts
//! - Circuit breaking for failing sources
//! - Per-source diagnostics

mod circuit_breaker;
mod diagnostics;
mod resolution_engine;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use diagnostics::{AttemptOutcome, FetchDiagnostics, ProviderAttempt, SkipReason};
pub use resolution_engine::{EngineConfig, ResolutionEngine};
