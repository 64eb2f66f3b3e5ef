//! Outcome of one logical call against one provider

use super::{ErrorClass, ProviderError, ProviderPayload, TokenUsage};
use crate::quality::QualityScore;
use serde::{Deserialize, Serialize};

/// Result of calling one provider for one request, retries included
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderCallResult {
	/// Provider name
	pub provider: String,
	/// Provider priority at call time (used for tie-breaks)
	pub priority: u32,
	/// Payload of the final, successful attempt
	pub payload: Option<ProviderPayload>,
	/// Wall-clock time across all attempts and backoff delays
	pub latency_ms: u64,
	/// Usage summed over all attempts
	pub usage: TokenUsage,
	/// Final error when no attempt succeeded
	#[serde(default)]
	pub error: Option<ProviderError>,
	/// Number of attempts made (1 when the first attempt settled it)
	pub attempts: u32,
	/// Quality of the payload, filled in by the scorer
	pub quality: Option<QualityScore>,
}

impl ProviderCallResult {
	pub fn success(
		provider: impl Into<String>,
		priority: u32,
		payload: ProviderPayload,
		attempts: u32,
	) -> Self {
		Self {
			provider: provider.into(),
			priority,
			payload: Some(payload),
			latency_ms: 0,
			usage: TokenUsage::default(),
			error: None,
			attempts,
			quality: None,
		}
	}

	pub fn failure(
		provider: impl Into<String>,
		priority: u32,
		error: ProviderError,
		attempts: u32,
	) -> Self {
		Self {
			provider: provider.into(),
			priority,
			payload: None,
			latency_ms: 0,
			usage: TokenUsage::default(),
			error: Some(error),
			attempts,
			quality: None,
		}
	}

	pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
		self.latency_ms = latency_ms;
		self
	}

	pub fn with_usage(mut self, usage: TokenUsage) -> Self {
		self.usage = usage;
		self
	}

	pub fn is_success(&self) -> bool {
		self.payload.is_some() && self.error.is_none()
	}

	pub fn error_class(&self) -> Option<ErrorClass> {
		self.error.as_ref().map(ProviderError::class)
	}

	/// Quality value, 0.0 for unscored or failed results
	pub fn score(&self) -> f64 {
		self.quality.as_ref().map(|q| q.value).unwrap_or(0.0)
	}
}
