//! Core adapter trait implemented by every provider variant

use super::{Capability, ProviderInput, ProviderResponse, ProviderResult};
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Uniform interface over one LLM provider
///
/// Implementations own nothing but their client handle. Every failure must be
/// returned as a classified [`ProviderError`](super::ProviderError); the
/// orchestrator never inspects provider-specific error details.
#[async_trait]
pub trait ProviderAdapter: Send + Sync + Debug {
	/// Identifier of this adapter instance (matches the registry key)
	fn id(&self) -> &str;

	/// Capabilities this adapter can serve
	fn capabilities(&self) -> &[Capability] {
		&Capability::ALL
	}

	fn supports(&self, capability: Capability) -> bool {
		self.capabilities().contains(&capability)
	}

	/// Perform one call; `timeout` is the budget for this single attempt
	async fn call(
		&self,
		capability: Capability,
		input: &ProviderInput,
		timeout: Duration,
	) -> ProviderResult<ProviderResponse>;
}
