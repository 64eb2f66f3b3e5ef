use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
	"OK"
}

/// Readiness response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
	pub status: String,
	pub available_providers: usize,
	pub total_providers: usize,
}

/// GET /ready - ready when at least one provider can take calls
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
	let now = chrono::Utc::now();
	let providers = state.orchestrator.provider_health().await;
	let available = providers.iter().filter(|p| p.is_available_at(now)).count();

	let (code, status) = if available > 0 {
		(StatusCode::OK, "ready")
	} else {
		(StatusCode::SERVICE_UNAVAILABLE, "degraded")
	};
	let body = ReadinessResponse {
		status: status.to_string(),
		available_providers: available,
		total_providers: providers.len(),
	};
	(code, Json(body))
}
