use axum::{
	extract::{rejection::JsonRejection, State},
	response::Json,
};
use llmo_types::{OrchestrationRequest, OrchestrationResult};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/v1/orchestrate - Run one request across providers
pub async fn post_orchestrate(
	State(state): State<AppState>,
	payload: Result<Json<OrchestrationRequest>, JsonRejection>,
) -> Result<Json<OrchestrationResult>, ApiError> {
	let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
	info!(
		"Received orchestration request {} ({}, {} chars)",
		request.request_id,
		request.capability,
		request.input.text.len()
	);

	let result = state.orchestrator.execute(request).await?;

	info!(
		"Returning result for {} via {} (confidence {:.2}, {}ms)",
		result.request_id, result.strategy_used, result.confidence, result.elapsed_ms
	);
	Ok(Json(result))
}
