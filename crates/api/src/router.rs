use axum::{
	routing::{get, post, put},
	Router,
};
use tower::ServiceBuilder;
use tower_http::{
	cors::CorsLayer,
	limit::RequestBodyLimitLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};
use tracing::Level;

use crate::handlers::{
	get_providers, health, post_orchestrate, put_provider_enabled, ready,
};
use crate::state::AppState;

/// Request bodies carry whole documents, so allow more than the usual 1MB
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

pub fn create_router() -> Router<AppState> {
	let cors = CorsLayer::permissive();
	let body_limit = RequestBodyLimitLayer::new(MAX_BODY_BYTES);
	let trace = TraceLayer::new_for_http()
		.make_span_with(|req: &axum::http::Request<_>| {
			let req_id = req
				.headers()
				.get("x-request-id")
				.and_then(|v| v.to_str().ok())
				.unwrap_or("-");
			tracing::info_span!(
				"http_request",
				method = %req.method(),
				uri = %req.uri(),
				req_id
			)
		})
		.on_request(tower_http::trace::DefaultOnRequest::new().level(Level::INFO))
		.on_response(
			tower_http::trace::DefaultOnResponse::new()
				.level(Level::INFO)
				.latency_unit(tower_http::LatencyUnit::Millis),
		);
	let req_id = ServiceBuilder::new()
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.layer(PropagateRequestIdLayer::x_request_id());

	Router::new()
		.route("/health", get(health))
		.route("/ready", get(ready))
		.route("/api/v1/orchestrate", post(post_orchestrate))
		.route("/api/v1/providers", get(get_providers))
		.route("/api/v1/providers/{id}/enabled", put(put_provider_enabled))
		.layer(cors)
		.layer(trace)
		.layer(req_id)
		.layer(body_limit)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handlers::common::ErrorResponse;
	use crate::handlers::providers::ProvidersResponse;
	use async_trait::async_trait;
	use axum::body::{to_bytes, Body};
	use axum::http::{Request, StatusCode};
	use llmo_service::OrchestratorTrait;
	use llmo_types::{
		Capability, CircuitState, OrchestrationError, OrchestrationOutcome, OrchestrationRequest,
		OrchestrationResult, ProviderHealth, ProviderIdentity, ProviderPayload, Strategy,
	};
	use std::sync::Arc;
	use tower::ServiceExt;

	/// Answers every request the same way
	struct FixedOrchestrator {
		outcome: OrchestrationOutcome<ProviderPayload>,
	}

	#[async_trait]
	impl OrchestratorTrait for FixedOrchestrator {
		async fn execute(
			&self,
			request: OrchestrationRequest,
		) -> OrchestrationOutcome<OrchestrationResult> {
			let payload = self.outcome.clone()?;
			Ok(OrchestrationResult {
				request_id: request.request_id,
				capability: request.capability,
				payload: Some(payload),
				strategy_requested: Strategy::Failover,
				strategy_used: Strategy::Failover,
				degradation: None,
				field_resolutions: Default::default(),
				results: Vec::new(),
				confidence: 0.9,
				chosen_provider: Some("primary".into()),
				elapsed_ms: 5,
			})
		}

		async fn provider_health(&self) -> Vec<ProviderHealth> {
			vec![ProviderHealth {
				identity: ProviderIdentity::new("primary", 0),
				capabilities: Capability::ALL.to_vec(),
				circuit_state: CircuitState::Closed,
				recent_success_rate: Some(1.0),
				recent_avg_latency_ms: Some(120.0),
				recent_p95_latency_ms: Some(150),
				recent_cost_usd: 0.01,
				recent_requests: 4,
				opened_at: None,
				cooldown_deadline: None,
			}]
		}

		fn set_enabled(&self, provider: &str, _enabled: bool) -> OrchestrationOutcome<()> {
			if provider == "primary" {
				Ok(())
			} else {
				Err(OrchestrationError::UnknownProvider {
					provider: provider.to_string(),
				})
			}
		}

		fn default_strategy(&self) -> Strategy {
			Strategy::Failover
		}
	}

	fn app(outcome: OrchestrationOutcome<ProviderPayload>) -> Router {
		create_router().with_state(AppState::new(Arc::new(FixedOrchestrator { outcome })))
	}

	fn orchestrate_request() -> Request<Body> {
		Request::builder()
			.method("POST")
			.uri("/api/v1/orchestrate")
			.header("content-type", "application/json")
			.body(Body::from(
				r#"{"input":{"text":"Lunch with Acme"},"capability":"extract"}"#,
			))
			.unwrap()
	}

	async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		serde_json::from_slice(&bytes).unwrap()
	}

	#[tokio::test]
	async fn test_health() {
		let response = app(Ok(ProviderPayload::new()))
			.oneshot(Request::get("/health").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		assert!(response.headers().contains_key("x-request-id"));
	}

	#[tokio::test]
	async fn test_orchestrate_success() {
		let response = app(Ok(ProviderPayload::new().with_field("name", "Acme")))
			.oneshot(orchestrate_request())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		let result: OrchestrationResult = body_json(response).await;
		assert_eq!(result.capability, Capability::Extract);
		assert_eq!(result.payload.unwrap().fields["name"], "Acme");
		assert!(!result.request_id.is_empty(), "request id defaults to a uuid");
	}

	#[tokio::test]
	async fn test_orchestrate_maps_errors() {
		let response = app(Err(OrchestrationError::NoProvidersAvailable {
			capability: Capability::Extract,
		}))
		.oneshot(orchestrate_request())
		.await
		.unwrap();
		assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

		let body: ErrorResponse = body_json(response).await;
		assert_eq!(body.error, "NO_PROVIDERS_AVAILABLE");
	}

	#[tokio::test]
	async fn test_list_providers() {
		let response = app(Ok(ProviderPayload::new()))
			.oneshot(Request::get("/api/v1/providers").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		let body: ProvidersResponse = body_json(response).await;
		assert_eq!(body.total_providers, 1);
		assert_eq!(body.providers[0].identity.name, "primary");
	}

	#[tokio::test]
	async fn test_kill_switch() {
		let put = |id: &str| {
			Request::builder()
				.method("PUT")
				.uri(format!("/api/v1/providers/{}/enabled", id))
				.header("content-type", "application/json")
				.body(Body::from(r#"{"enabled":false}"#))
				.unwrap()
		};

		let ok = app(Ok(ProviderPayload::new()))
			.oneshot(put("primary"))
			.await
			.unwrap();
		assert_eq!(ok.status(), StatusCode::OK);

		let missing = app(Ok(ProviderPayload::new()))
			.oneshot(put("ghost"))
			.await
			.unwrap();
		assert_eq!(missing.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_ready_with_available_provider() {
		let response = app(Ok(ProviderPayload::new()))
			.oneshot(Request::get("/ready").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
	}
}
