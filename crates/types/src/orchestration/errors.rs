//! Request-level orchestration errors
//!
//! Individual provider failures never surface here; they are absorbed and
//! reported inside [`super::OrchestrationResult::results`].

use thiserror::Error;

use crate::providers::Capability;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestrationError {
	/// The capability is supported but no provider is currently eligible
	#[error("No providers available for {capability}")]
	NoProvidersAvailable { capability: Capability },

	#[error("Insufficient providers: {available} eligible, {required} required")]
	InsufficientProviders { required: usize, available: usize },

	/// The request deadline passed before any provider succeeded
	#[error("Deadline of {timeout_ms}ms exceeded before any provider succeeded")]
	DeadlineExceeded { timeout_ms: u64 },

	#[error("All {attempted} providers failed; last error: {last_error}")]
	AllProvidersFailed { attempted: usize, last_error: String },

	/// No registered provider declares the capability at all
	#[error("No registered provider supports {capability}")]
	UnsupportedCapability { capability: Capability },

	#[error("Unknown provider: {provider}")]
	UnknownProvider { provider: String },

	#[error("Invalid request: {reason}")]
	InvalidRequest { reason: String },
}

impl OrchestrationError {
	/// Stable machine-readable code
	pub fn code(&self) -> &'static str {
		match self {
			OrchestrationError::NoProvidersAvailable { .. } => "NO_PROVIDERS_AVAILABLE",
			OrchestrationError::InsufficientProviders { .. } => "INSUFFICIENT_PROVIDERS",
			OrchestrationError::DeadlineExceeded { .. } => "DEADLINE_EXCEEDED",
			OrchestrationError::AllProvidersFailed { .. } => "ALL_PROVIDERS_FAILED",
			OrchestrationError::UnsupportedCapability { .. } => "UNSUPPORTED_CAPABILITY",
			OrchestrationError::UnknownProvider { .. } => "UNKNOWN_PROVIDER",
			OrchestrationError::InvalidRequest { .. } => "INVALID_REQUEST",
		}
	}
}

pub type OrchestrationOutcome<T> = Result<T, OrchestrationError>;
