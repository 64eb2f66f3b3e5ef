//! Provider fixtures built on the crate's public mock provider

use std::time::Duration;

use llmo_orchestrator::mocks::{invoice_payload, MockProvider};
use llmo_orchestrator::{
	Capability, OrchestrationRequest, OrchestratorBuilder, ProviderError, ProviderInput,
	ResultSchema, Settings, Strategy,
};

/// Per-call budget given to every mock provider
pub const MOCK_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ProviderFixtures;

#[allow(dead_code)]
impl ProviderFixtures {
	pub fn invoice(id: &str, vendor: &str, confidence: f64) -> MockProvider {
		MockProvider::returning(id, invoice_payload(vendor, 120.5, confidence))
	}

	pub fn unauthorized(id: &str) -> MockProvider {
		MockProvider::failing(id, ProviderError::from_http_status(401, "invalid api key"))
	}

	pub fn unavailable(id: &str) -> MockProvider {
		MockProvider::failing(id, ProviderError::from_http_status(503, "overloaded"))
	}

	/// Builder with `providers` registered at priority 1, 2, 3...
	pub fn builder(settings: Settings, providers: &[MockProvider]) -> OrchestratorBuilder {
		providers.iter().enumerate().fold(
			OrchestratorBuilder::new().with_settings(settings),
			|builder, (index, provider)| {
				builder.with_provider(
					provider.identity(index as u32 + 1),
					provider.clone().into_adapter(),
					MOCK_TIMEOUT,
				)
			},
		)
	}

	pub fn extract_request(strategy: Strategy) -> OrchestrationRequest {
		let input = ProviderInput::new("Invoice #42 from Acme Corp, total $120.50")
			.with_schema(ResultSchema::required(["vendor", "total", "currency"]));
		OrchestrationRequest::new(input, Capability::Extract).with_strategy(strategy)
	}

	pub fn extract_request_json(strategy: Strategy) -> serde_json::Value {
		serde_json::json!({
			"input": {
				"text": "Invoice #42 from Acme Corp, total $120.50",
				"schema": { "required_fields": ["vendor", "total", "currency"] }
			},
			"capability": "extract",
			"strategy": strategy.as_str(),
		})
	}
}
