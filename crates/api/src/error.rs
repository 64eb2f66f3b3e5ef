//! Mapping of orchestration errors onto HTTP responses

use axum::{
	http::StatusCode,
	response::{IntoResponse, Json, Response},
};
use llmo_types::OrchestrationError;
use thiserror::Error;

use crate::handlers::common::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
	#[error(transparent)]
	Orchestration(#[from] OrchestrationError),

	#[error("{0}")]
	BadRequest(String),
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::Orchestration(err) => match err {
				OrchestrationError::NoProvidersAvailable { .. }
				| OrchestrationError::InsufficientProviders { .. } => StatusCode::SERVICE_UNAVAILABLE,
				OrchestrationError::UnsupportedCapability { .. } => StatusCode::UNPROCESSABLE_ENTITY,
				OrchestrationError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
				OrchestrationError::AllProvidersFailed { .. } => StatusCode::BAD_GATEWAY,
				OrchestrationError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
				OrchestrationError::UnknownProvider { .. } => StatusCode::NOT_FOUND,
			},
			ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
		}
	}

	pub fn code(&self) -> &'static str {
		match self {
			ApiError::Orchestration(err) => err.code(),
			ApiError::BadRequest(_) => "VALIDATION_ERROR",
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();
		let body = ErrorResponse::new(self.code(), self.to_string());
		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use llmo_types::Capability;

	#[test]
	fn test_status_mapping() {
		let cases = [
			(
				OrchestrationError::NoProvidersAvailable {
					capability: Capability::Extract,
				},
				StatusCode::SERVICE_UNAVAILABLE,
			),
			(
				OrchestrationError::UnsupportedCapability {
					capability: Capability::Classify,
				},
				StatusCode::UNPROCESSABLE_ENTITY,
			),
			(
				OrchestrationError::DeadlineExceeded { timeout_ms: 100 },
				StatusCode::GATEWAY_TIMEOUT,
			),
			(
				OrchestrationError::AllProvidersFailed {
					attempted: 2,
					last_error: "boom".into(),
				},
				StatusCode::BAD_GATEWAY,
			),
			(
				OrchestrationError::UnknownProvider {
					provider: "ghost".into(),
				},
				StatusCode::NOT_FOUND,
			),
		];
		for (err, status) in cases {
			assert_eq!(ApiError::from(err).status(), status);
		}
		assert_eq!(
			ApiError::BadRequest("nope".into()).status(),
			StatusCode::BAD_REQUEST
		);
	}
}
