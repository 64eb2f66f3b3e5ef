//! Mock providers for demos and testing
//!
//! [`MockProvider`] answers calls from a fixed behavior, optionally after a
//! delay or a number of scripted failures, and counts the calls it receives.
//! Clones share the call counter so a test can keep a handle after the
//! provider has been moved into the orchestrator.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llmo_types::serde_json::Value;
use llmo_types::{
	Capability, ProviderAdapter, ProviderError, ProviderIdentity, ProviderInput, ProviderPayload,
	ProviderResponse, ProviderResult, TokenUsage,
};

/// What a mock provider does once its scripted failures are used up
#[derive(Debug, Clone)]
pub enum MockBehavior {
	/// Return this payload
	Succeed(ProviderPayload),
	/// Return this error
	Fail(ProviderError),
	/// Never answer; the call only ends when the orchestrator times it out
	Hang,
}

#[derive(Debug, Clone)]
pub struct MockProvider {
	id: String,
	capabilities: Vec<Capability>,
	behavior: MockBehavior,
	usage: TokenUsage,
	delay: Duration,
	fail_first: u32,
	fail_first_with: ProviderError,
	calls: Arc<AtomicU32>,
}

impl MockProvider {
	pub fn new(id: impl Into<String>, behavior: MockBehavior) -> Self {
		Self {
			id: id.into(),
			capabilities: Capability::ALL.to_vec(),
			behavior,
			usage: TokenUsage {
				input_tokens: 120,
				output_tokens: 30,
				cost_usd: 0.0015,
			},
			delay: Duration::ZERO,
			fail_first: 0,
			fail_first_with: ProviderError::from_http_status(503, "temporarily unavailable"),
			calls: Arc::new(AtomicU32::new(0)),
		}
	}

	/// Provider that always returns `payload`
	pub fn returning(id: impl Into<String>, payload: ProviderPayload) -> Self {
		Self::new(id, MockBehavior::Succeed(payload))
	}

	/// Provider that always fails with `error`
	pub fn failing(id: impl Into<String>, error: ProviderError) -> Self {
		Self::new(id, MockBehavior::Fail(error))
	}

	pub fn hanging(id: impl Into<String>) -> Self {
		Self::new(id, MockBehavior::Hang)
	}

	pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
		self.capabilities = capabilities;
		self
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	pub fn with_usage(mut self, usage: TokenUsage) -> Self {
		self.usage = usage;
		self
	}

	/// Fail the first `times` calls with `error` before applying the behavior
	pub fn fail_times(mut self, times: u32, error: ProviderError) -> Self {
		self.fail_first = times;
		self.fail_first_with = error;
		self
	}

	/// Number of calls received so far, shared by all clones
	pub fn calls(&self) -> u32 {
		self.calls.load(Ordering::SeqCst)
	}

	/// Identity for registering this mock at `priority`
	pub fn identity(&self, priority: u32) -> ProviderIdentity {
		ProviderIdentity::new(self.id.clone(), priority)
	}

	pub fn into_adapter(self) -> Arc<dyn ProviderAdapter> {
		Arc::new(self)
	}
}

#[async_trait]
impl ProviderAdapter for MockProvider {
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
		let call_number = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}
		if call_number <= self.fail_first {
			return Err(self.fail_first_with.clone());
		}

		match &self.behavior {
			MockBehavior::Succeed(payload) => {
				Ok(ProviderResponse::new(payload.clone()).with_usage(self.usage))
			},
			MockBehavior::Fail(error) => Err(error.clone()),
			MockBehavior::Hang => std::future::pending().await,
		}
	}
}

/// Invoice extraction result used across demos and tests
///
/// Every field carries confidence `confidence`.
pub fn invoice_payload(vendor: &str, total: f64, confidence: f64) -> ProviderPayload {
	ProviderPayload::new()
		.with_field("vendor", vendor)
		.with_field("total", total)
		.with_field("currency", "USD")
		.with_confidence("vendor", confidence)
		.with_confidence("total", confidence)
		.with_confidence("currency", confidence)
}

/// Payload with every field null, as returned when nothing was found
pub fn empty_payload(fields: &[&str]) -> ProviderPayload {
	fields
		.iter()
		.fold(ProviderPayload::new(), |payload, field| {
			payload.with_field(*field, Value::Null)
		})
}
