//! Generic JSON-over-HTTP provider adapter
//!
//! Each capability is served at `{endpoint}/{capability}`. The provider
//! receives the input text, classification context and expected schema, and
//! answers with extracted fields plus per-field confidence.

use async_trait::async_trait;
use llmo_config::ProviderSettings;
use llmo_types::{
	Capability, ClassificationContext, PermanentError, ProviderAdapter, ProviderError,
	ProviderInput, ProviderPayload, ProviderResponse, ProviderResult, ResultSchema,
	SecretString, TokenUsage, TransientError,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT_VALUE: &str = concat!("llmo-orchestrator/", env!("CARGO_PKG_VERSION"));

/// Maximum number of body bytes carried into an error reason
const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Debug, Serialize)]
struct HttpProviderRequest<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	model: Option<&'a str>,
	capability: Capability,
	text: &'a str,
	#[serde(skip_serializing_if = "context_is_empty")]
	context: &'a ClassificationContext,
	schema: &'a ResultSchema,
}

#[derive(Debug, Deserialize)]
struct HttpProviderResponse {
	#[serde(default)]
	fields: BTreeMap<String, Value>,
	#[serde(default)]
	confidence: BTreeMap<String, f64>,
	#[serde(default = "default_schema_valid")]
	schema_valid: bool,
	#[serde(default)]
	usage: Option<HttpUsage>,
}

fn context_is_empty(context: &&ClassificationContext) -> bool {
	context.is_empty()
}

fn default_schema_valid() -> bool {
	true
}

#[derive(Debug, Deserialize)]
struct HttpUsage {
	#[serde(default)]
	input_tokens: u32,
	#[serde(default)]
	output_tokens: u32,
}

/// Adapter for a provider reachable over plain HTTP + JSON
#[derive(Debug)]
pub struct HttpProviderAdapter {
	id: String,
	endpoint: Url,
	model: Option<String>,
	capabilities: Vec<Capability>,
	cost_per_1k_tokens: Option<f64>,
	client: Client,
}

impl HttpProviderAdapter {
	/// Build an adapter from the provider's configuration entry
	pub fn from_settings(id: &str, settings: &ProviderSettings) -> ProviderResult<Self> {
		let api_key = settings
			.resolve_api_key()
			.map_err(|e| configuration_error(id, e.to_string()))?;

		Self::new(
			id,
			&settings.endpoint,
			api_key.as_ref(),
			settings.headers.iter().flatten(),
		)
		.map(|adapter| {
			adapter
				.with_model(settings.model.clone())
				.with_capabilities(settings.capabilities())
				.with_cost_per_1k_tokens(settings.cost_per_1k_tokens)
		})
	}

	pub fn new<'a>(
		id: &str,
		endpoint: &str,
		api_key: Option<&SecretString>,
		extra_headers: impl IntoIterator<Item = (&'a String, &'a String)>,
	) -> ProviderResult<Self> {
		let mut endpoint = Url::parse(endpoint)
			.map_err(|e| configuration_error(id, format!("invalid endpoint '{}': {}", endpoint, e)))?;
		// Treat the endpoint as a directory so capability paths are appended
		if !endpoint.path().ends_with('/') {
			endpoint.set_path(&format!("{}/", endpoint.path()));
		}

		let mut headers = HeaderMap::new();
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

		if let Some(key) = api_key {
			let mut value = HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
				.map_err(|_| configuration_error(id, "API key is not a valid header value"))?;
			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}

		for (key, value) in extra_headers {
			match (HeaderName::from_str(key), HeaderValue::from_str(value)) {
				(Ok(name), Ok(value)) => {
					headers.insert(name, value);
				},
				_ => warn!("Provider {}: ignoring invalid header '{}'", id, key),
			}
		}

		let client = Client::builder()
			.default_headers(headers)
			.pool_max_idle_per_host(10)
			.pool_idle_timeout(Duration::from_secs(90))
			.build()
			.map_err(|e| configuration_error(id, format!("failed to build HTTP client: {}", e)))?;

		Ok(Self {
			id: id.to_string(),
			endpoint,
			model: None,
			capabilities: Capability::ALL.to_vec(),
			cost_per_1k_tokens: None,
			client,
		})
	}

	pub fn with_model(mut self, model: Option<String>) -> Self {
		self.model = model;
		self
	}

	pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
		self.capabilities = capabilities;
		self
	}

	pub fn with_cost_per_1k_tokens(mut self, cost: Option<f64>) -> Self {
		self.cost_per_1k_tokens = cost;
		self
	}

	fn capability_url(&self, capability: Capability) -> ProviderResult<Url> {
		self.endpoint.join(capability.as_str()).map_err(|e| {
			configuration_error(
				&self.id,
				format!("cannot join '{}' to {}: {}", capability, self.endpoint, e),
			)
		})
	}

	fn usage_from(&self, usage: Option<HttpUsage>) -> TokenUsage {
		let Some(usage) = usage else {
			return TokenUsage::default();
		};
		let total = f64::from(usage.input_tokens) + f64::from(usage.output_tokens);
		TokenUsage {
			input_tokens: usage.input_tokens,
			output_tokens: usage.output_tokens,
			cost_usd: self
				.cost_per_1k_tokens
				.map(|rate| total / 1000.0 * rate)
				.unwrap_or(0.0),
		}
	}
}

fn configuration_error(id: &str, reason: impl Into<String>) -> ProviderError {
	PermanentError::Configuration {
		reason: format!("provider {}: {}", id, reason.into()),
	}
	.into()
}

/// Classify a transport-level failure
fn classify_reqwest_error(err: reqwest::Error, timeout: Duration) -> ProviderError {
	if err.is_timeout() {
		ProviderError::timeout(timeout.as_millis() as u64)
	} else if err.is_builder() {
		PermanentError::MalformedRequest {
			reason: err.to_string(),
		}
		.into()
	} else {
		TransientError::Network {
			message: err.to_string(),
		}
		.into()
	}
}

/// `Retry-After` in seconds, converted to milliseconds
fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
	headers
		.get(reqwest::header::RETRY_AFTER)?
		.to_str()
		.ok()?
		.trim()
		.parse::<u64>()
		.ok()
		.map(|secs| secs.saturating_mul(1000))
}

fn truncate(mut body: String) -> String {
	if body.len() > MAX_ERROR_BODY_LEN {
		let mut cut = MAX_ERROR_BODY_LEN;
		while !body.is_char_boundary(cut) {
			cut -= 1;
		}
		body.truncate(cut);
	}
	body
}

#[async_trait]
impl ProviderAdapter for HttpProviderAdapter {
	fn id(&self) -> &str {
		&self.id
	}

	fn capabilities(&self) -> &[Capability] {
		&self.capabilities
	}

	async fn call(
		&self,
		capability: Capability,
		input: &ProviderInput,
		timeout: Duration,
	) -> ProviderResult<ProviderResponse> {
		if !self.supports(capability) {
			return Err(PermanentError::UnsupportedCapability {
				capability: capability.to_string(),
			}
			.into());
		}

		let url = self.capability_url(capability)?;
		debug!(
			"Calling provider {} for {} at {} (timeout {}ms)",
			self.id,
			capability,
			url,
			timeout.as_millis()
		);

		let body = HttpProviderRequest {
			model: self.model.as_deref(),
			capability,
			text: &input.text,
			context: &input.context,
			schema: &input.schema,
		};

		let response = self
			.client
			.post(url)
			.timeout(timeout)
			.json(&body)
			.send()
			.await
			.map_err(|e| classify_reqwest_error(e, timeout))?;

		let status = response.status();
		if !status.is_success() {
			let retry_after = retry_after_ms(response.headers());
			let body = truncate(response.text().await.unwrap_or_default());
			let error = if status == StatusCode::TOO_MANY_REQUESTS {
				TransientError::RateLimited {
					retry_after_ms: retry_after,
				}
				.into()
			} else {
				ProviderError::from_http_status(status.as_u16(), body)
			};
			debug!("Provider {} returned {}: {}", self.id, status, error);
			return Err(error);
		}

		let parsed: HttpProviderResponse = response.json().await.map_err(|e| {
			if e.is_timeout() {
				ProviderError::timeout(timeout.as_millis() as u64)
			} else {
				PermanentError::InvalidResponse {
					reason: format!("provider {}: {}", self.id, e),
				}
				.into()
			}
		})?;

		let payload = ProviderPayload {
			fields: parsed.fields,
			confidence: parsed.confidence,
			schema_valid: parsed.schema_valid,
		};
		Ok(ProviderResponse::new(payload).with_usage(self.usage_from(parsed.usage)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{
		extract::Path,
		http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus},
		response::IntoResponse,
		routing::post,
		Json, Router,
	};
	use serde_json::json;

	async fn spawn_provider() -> String {
		async fn handle(
			Path(capability): Path<String>,
			headers: AxumHeaders,
			Json(body): Json<Value>,
		) -> axum::response::Response {
			let text = body["text"].as_str().unwrap_or_default().to_string();
			match text.as_str() {
				"slow" => {
					tokio::time::sleep(Duration::from_millis(500)).await;
					Json(json!({})).into_response()
				},
				"rate" => (
					AxumStatus::TOO_MANY_REQUESTS,
					[("retry-after", "2")],
					"slow down",
				)
					.into_response(),
				"boom" => (AxumStatus::BAD_GATEWAY, "upstream").into_response(),
				"reject" => (AxumStatus::UNPROCESSABLE_ENTITY, "bad schema").into_response(),
				"garbage" => (AxumStatus::OK, "not json").into_response(),
				_ => {
					let auth = headers
						.get("authorization")
						.and_then(|v| v.to_str().ok())
						.unwrap_or("")
						.to_string();
					if auth != "Bearer sk-test" {
						return (AxumStatus::UNAUTHORIZED, "missing key").into_response();
					}
					Json(json!({
						"fields": {"capability": capability, "name": "Acme", "date": null},
						"confidence": {"name": 0.9},
						"usage": {"input_tokens": 600, "output_tokens": 400}
					}))
					.into_response()
				},
			}
		}

		let app = Router::new().route("/v1/{capability}", post(handle));
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		format!("http://{}/v1", addr)
	}

	fn adapter(endpoint: &str) -> HttpProviderAdapter {
		let key = SecretString::from("sk-test");
		HttpProviderAdapter::new("alpha", endpoint, Some(&key), std::iter::empty())
			.unwrap()
			.with_cost_per_1k_tokens(Some(0.5))
	}

	#[tokio::test]
	async fn test_successful_call_parses_payload_and_usage() {
		let endpoint = spawn_provider().await;
		let response = adapter(&endpoint)
			.call(
				Capability::Extract,
				&ProviderInput::new("Invoice from Acme"),
				Duration::from_secs(2),
			)
			.await
			.unwrap();

		assert_eq!(response.payload.value("name"), Some(&json!("Acme")));
		assert_eq!(response.payload.value("capability"), Some(&json!("extract")));
		assert!(response.payload.value("date").is_none());
		assert!(response.payload.schema_valid);
		assert_eq!(response.usage.total_tokens(), 1000);
		assert!((response.usage.cost_usd - 0.5).abs() < 1e-9);
	}

	#[tokio::test]
	async fn test_status_classification() {
		let endpoint = spawn_provider().await;
		let adapter = adapter(&endpoint);
		let call = |text: &'static str| {
			let adapter = &adapter;
			async move {
				adapter
					.call(
						Capability::Classify,
						&ProviderInput::new(text),
						Duration::from_secs(2),
					)
					.await
					.unwrap_err()
			}
		};

		assert_eq!(
			call("rate").await,
			ProviderError::Transient(TransientError::RateLimited {
				retry_after_ms: Some(2000)
			})
		);
		assert!(call("boom").await.is_transient());
		assert!(matches!(
			call("reject").await,
			ProviderError::Permanent(PermanentError::SchemaRejected { .. })
		));
		assert!(matches!(
			call("garbage").await,
			ProviderError::Permanent(PermanentError::InvalidResponse { .. })
		));
	}

	#[tokio::test]
	async fn test_missing_key_is_permanent_auth_failure() {
		let endpoint = spawn_provider().await;
		let adapter =
			HttpProviderAdapter::new("beta", &endpoint, None, std::iter::empty()).unwrap();
		let err = adapter
			.call(
				Capability::Extract,
				&ProviderInput::new("hello"),
				Duration::from_secs(2),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			ProviderError::Permanent(PermanentError::AuthenticationFailed { .. })
		));
	}

	#[tokio::test]
	async fn test_timeout_is_transient() {
		let endpoint = spawn_provider().await;
		let err = adapter(&endpoint)
			.call(
				Capability::Extract,
				&ProviderInput::new("slow"),
				Duration::from_millis(100),
			)
			.await
			.unwrap_err();
		assert!(err.is_timeout());
		assert!(err.is_transient());
	}

	#[tokio::test]
	async fn test_unsupported_capability_short_circuits() {
		let adapter = adapter("http://127.0.0.1:9/v1").with_capabilities(vec![Capability::Extract]);
		let err = adapter
			.call(
				Capability::Summarize,
				&ProviderInput::new("hello"),
				Duration::from_secs(1),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			ProviderError::Permanent(PermanentError::UnsupportedCapability { .. })
		));
	}

	#[test]
	fn test_capability_url_joins_path() {
		let adapter = adapter("https://llm.example.com/api/v1");
		assert_eq!(
			adapter.capability_url(Capability::Summarize).unwrap().as_str(),
			"https://llm.example.com/api/v1/summarize"
		);
	}

	#[test]
	fn test_invalid_endpoint_is_configuration_error() {
		let err = HttpProviderAdapter::new("bad", "not a url", None, std::iter::empty())
			.unwrap_err();
		assert!(matches!(
			err,
			ProviderError::Permanent(PermanentError::Configuration { .. })
		));
	}

	#[test]
	fn test_truncate_respects_char_boundaries() {
		let long = "é".repeat(MAX_ERROR_BODY_LEN);
		let cut = truncate(long);
		assert!(cut.len() <= MAX_ERROR_BODY_LEN);
	}
}
