//! Provider health and kill-switch handlers

use axum::{
	extract::{rejection::JsonRejection, Path, State},
	response::Json,
};
use llmo_types::ProviderHealth;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ProvidersResponse {
	pub providers: Vec<ProviderHealth>,
	pub total_providers: usize,
	pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetEnabledRequest {
	pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetEnabledResponse {
	pub provider: String,
	pub enabled: bool,
}

/// GET /api/v1/providers - Health snapshot of every provider
pub async fn get_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
	debug!("Listing provider health");
	let providers = state.orchestrator.provider_health().await;
	Json(ProvidersResponse {
		total_providers: providers.len(),
		providers,
		timestamp: chrono::Utc::now().timestamp(),
	})
}

/// PUT /api/v1/providers/{id}/enabled - Operator kill-switch
pub async fn put_provider_enabled(
	State(state): State<AppState>,
	Path(provider_id): Path<String>,
	payload: Result<Json<SetEnabledRequest>, JsonRejection>,
) -> Result<Json<SetEnabledResponse>, ApiError> {
	let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
	state
		.orchestrator
		.set_enabled(&provider_id, request.enabled)?;
	info!(
		"Operator set provider '{}' enabled={}",
		provider_id, request.enabled
	);
	Ok(Json(SetEnabledResponse {
		provider: provider_id,
		enabled: request.enabled,
	}))
}
