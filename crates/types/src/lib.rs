//! LLM Orchestration Types
//!
//! Shared models and traits for the multi-provider LLM orchestration layer:
//! the provider adapter contract and its error taxonomy, circuit breaker and
//! metrics data structures, and the orchestration request/result models.

pub mod circuit_breaker;
pub mod constants;
pub mod health;
pub mod metrics;
pub mod orchestration;
pub mod providers;
pub mod quality;
pub mod secret_string;
pub mod storage;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

pub use circuit_breaker::{CircuitBreakerState, CircuitState, FailureWindow};

pub use health::ProviderHealth;

pub use metrics::{MetricsAggregate, MetricsDataPoint, MetricsTimeSeries, TimeRange};

pub use orchestration::{
	Degradation, FieldResolution, OrchestrationError, OrchestrationOutcome, OrchestrationRequest,
	OrchestrationResult, Strategy,
};

pub use providers::{
	Capability, ClassificationContext, ErrorClass, FieldType, PermanentError, ProviderAdapter,
	ProviderCallResult, ProviderError, ProviderIdentity, ProviderInput, ProviderPayload,
	ProviderResponse, ProviderResult, ResultSchema, TokenUsage, TransientError,
};

pub use quality::{QualityScore, SchemaViolation};

pub use secret_string::SecretString;

pub use storage::{MetricsStore, StorageError, StorageResult, StorageStats};
