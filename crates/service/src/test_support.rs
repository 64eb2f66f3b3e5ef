//! Scripted provider used by unit tests

use async_trait::async_trait;
use llmo_types::{
	Capability, ProviderAdapter, ProviderError, ProviderInput, ProviderPayload, ProviderResponse,
	ProviderResult, TokenUsage,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
pub struct StubProvider {
	id: String,
	capabilities: Vec<Capability>,
	script: Mutex<VecDeque<ProviderResult<ProviderResponse>>>,
	fallback: ProviderResult<ProviderResponse>,
	delay: Duration,
	calls: AtomicU32,
}

impl StubProvider {
	pub fn returning(id: &str, payload: ProviderPayload) -> Self {
		Self {
			id: id.to_string(),
			capabilities: Capability::ALL.to_vec(),
			script: Mutex::new(VecDeque::new()),
			fallback: Ok(ProviderResponse::new(payload).with_usage(TokenUsage {
				input_tokens: 100,
				output_tokens: 20,
				cost_usd: 0.001,
			})),
			delay: Duration::ZERO,
			calls: AtomicU32::new(0),
		}
	}

	pub fn succeeding(id: &str) -> Self {
		Self::returning(
			id,
			ProviderPayload::new()
				.with_field("answer", id)
				.with_confidence("answer", 0.9),
		)
	}

	pub fn failing(id: &str, error: ProviderError) -> Self {
		let mut stub = Self::succeeding(id);
		stub.fallback = Err(error);
		stub
	}

	pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
		self.capabilities = capabilities;
		self
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	/// Answer the next call with `result` before falling back
	pub fn then(self, result: ProviderResult<ProviderResponse>) -> Self {
		if let Ok(mut script) = self.script.lock() {
			script.push_back(result);
		}
		self
	}

	pub fn into_arc(self) -> Arc<Self> {
		Arc::new(self)
	}

	pub fn calls(&self) -> u32 {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ProviderAdapter for StubProvider {
	fn id(&self) -> &str {
		&self.id
	}

	fn capabilities(&self) -> &[Capability] {
		&self.capabilities
	}

	async fn call(
		&self,
		_capability: Capability,
		_input: &ProviderInput,
		_timeout: Duration,
	) -> ProviderResult<ProviderResponse> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}
		let scripted = self
			.script
			.lock()
			.ok()
			.and_then(|mut script| script.pop_front());
		scripted.unwrap_or_else(|| self.fallback.clone())
	}
}
