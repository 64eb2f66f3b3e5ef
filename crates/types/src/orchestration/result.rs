//! Orchestration result model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::Strategy;
use crate::providers::{Capability, ProviderCallResult, ProviderPayload, TokenUsage};

/// Annotation recorded when the requested strategy could not run as asked
///
/// Not an error: the result is still usable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Degradation {
	pub requested: Strategy,
	pub used: Strategy,
	pub reason: String,
}

/// How a consensus field value was decided
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FieldResolution {
	/// More than half of the providers that returned the field agreed
	Majority {
		value: Value,
		votes: usize,
		voters: usize,
	},
	/// No majority; taken from the highest-scoring result that had the field
	TieBreak {
		value: Value,
		provider: String,
		voters: usize,
	},
}

impl FieldResolution {
	pub fn value(&self) -> &Value {
		match self {
			FieldResolution::Majority { value, .. } | FieldResolution::TieBreak { value, .. } => {
				value
			},
		}
	}

	pub fn is_majority(&self) -> bool {
		matches!(self, FieldResolution::Majority { .. })
	}

	/// Share of voters that agreed with the chosen value
	pub fn agreement(&self) -> f64 {
		match self {
			FieldResolution::Majority { votes, voters, .. } if *voters > 0 => {
				*votes as f64 / *voters as f64
			},
			FieldResolution::TieBreak { voters, .. } if *voters > 0 => 1.0 / *voters as f64,
			_ => 0.0,
		}
	}
}

/// The orchestrator's decision for one request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestrationResult {
	pub request_id: String,
	pub capability: Capability,
	/// Decided payload; `None` for `AllProviders`, which does not reduce
	pub payload: Option<ProviderPayload>,
	pub strategy_requested: Strategy,
	/// Strategy that actually produced the decision
	pub strategy_used: Strategy,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub degradation: Option<Degradation>,
	/// Per-field report, populated only by consensus
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub field_resolutions: BTreeMap<String, FieldResolution>,
	/// Every provider call considered, including failures
	pub results: Vec<ProviderCallResult>,
	/// Overall decision confidence in [0, 1]
	pub confidence: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chosen_provider: Option<String>,
	pub elapsed_ms: u64,
}

impl OrchestrationResult {
	pub fn is_degraded(&self) -> bool {
		self.degradation.is_some()
	}

	pub fn successful_results(&self) -> impl Iterator<Item = &ProviderCallResult> {
		self.results.iter().filter(|r| r.is_success())
	}

	/// Summed token usage and cost across every call considered
	pub fn total_usage(&self) -> TokenUsage {
		self.results
			.iter()
			.fold(TokenUsage::default(), |acc, r| acc + r.usage)
	}

	pub fn result_for(&self, provider: &str) -> Option<&ProviderCallResult> {
		self.results.iter().find(|r| r.provider == provider)
	}
}
