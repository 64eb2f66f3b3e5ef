//! Orchestration request model

use serde::{Deserialize, Serialize};

use super::{OrchestrationError, Strategy};
use crate::constants::limits::{MAX_PROVIDER_TIMEOUT_MS, MIN_PROVIDER_TIMEOUT_MS};
use crate::providers::{Capability, ProviderInput};

fn generate_request_id() -> String {
	uuid::Uuid::new_v4().to_string()
}

/// One unit of work for the orchestrator, immutable once constructed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestrationRequest {
	#[serde(default = "generate_request_id")]
	pub request_id: String,
	pub input: ProviderInput,
	pub capability: Capability,
	/// Falls back to the configured default strategy when absent
	#[serde(default)]
	pub strategy: Option<Strategy>,
	/// Overrides the configured request timeout
	#[serde(default)]
	pub timeout_ms: Option<u64>,
	/// Minimum number of eligible providers required to proceed
	#[serde(default)]
	pub min_providers: Option<usize>,
}

impl OrchestrationRequest {
	pub fn new(input: ProviderInput, capability: Capability) -> Self {
		Self {
			request_id: generate_request_id(),
			input,
			capability,
			strategy: None,
			timeout_ms: None,
			min_providers: None,
		}
	}

	pub fn with_strategy(mut self, strategy: Strategy) -> Self {
		self.strategy = Some(strategy);
		self
	}

	pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.timeout_ms = Some(timeout_ms);
		self
	}

	pub fn with_min_providers(mut self, min_providers: usize) -> Self {
		self.min_providers = Some(min_providers);
		self
	}

	/// Reject requests that can never be served
	pub fn validate(&self) -> Result<(), OrchestrationError> {
		if let Some(timeout_ms) = self.timeout_ms {
			if !(MIN_PROVIDER_TIMEOUT_MS..=MAX_PROVIDER_TIMEOUT_MS).contains(&timeout_ms) {
				return Err(OrchestrationError::InvalidRequest {
					reason: format!(
						"timeout_ms must be between {} and {}, got {}",
						MIN_PROVIDER_TIMEOUT_MS, MAX_PROVIDER_TIMEOUT_MS, timeout_ms
					),
				});
			}
		}
		if self.min_providers == Some(0) {
			return Err(OrchestrationError::InvalidRequest {
				reason: "min_providers must be at least 1".to_string(),
			});
		}
		if self.input.text.trim().is_empty() {
			return Err(OrchestrationError::InvalidRequest {
				reason: "input text must not be empty".to_string(),
			});
		}
		Ok(())
	}
}
