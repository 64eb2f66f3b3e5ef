//! LLM Orchestrator Service
//!
//! Core orchestration logic: retries, circuit breaking, quality scoring,
//! consensus and the strategies that tie them together.

pub mod circuit_breaker;
pub mod consensus;
pub mod health;
pub mod orchestrator;
pub mod providers;
pub mod quality;
pub mod retry;
pub mod selection;

#[cfg(test)]
mod test_support;

pub use circuit_breaker::{
	CallPermit, CircuitBreakerConfig, CircuitBreakerService, CircuitBreakerTrait,
};
pub use consensus::ConsensusOutcome;
pub use health::collect_provider_health;
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorTrait};
pub use providers::{ProviderEntry, ProviderTable};
pub use quality::{QualityScorer, SchemaValidator};
pub use retry::{RetryAttempt, RetryPolicy};
