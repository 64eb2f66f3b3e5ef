//! Error types for provider calls
//!
//! Adapters classify every failure as either transient (worth retrying) or
//! permanent (surfaced immediately). The rest of the orchestration layer only
//! ever looks at that classification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a provider failure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
	/// Timeout, rate-limit, 5xx, network - retried per policy
	Transient,
	/// Auth, malformed request, schema rejection - never retried
	Permanent,
}

impl ErrorClass {
	pub fn is_retriable(&self) -> bool {
		matches!(self, ErrorClass::Transient)
	}
}

/// Failures that may succeed if the call is repeated
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransientError {
	#[error("Timeout occurred after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("Rate limit exceeded")]
	RateLimited { retry_after_ms: Option<u64> },

	#[error("HTTP {status_code}: {reason}")]
	ServerError { status_code: u16, reason: String },

	#[error("Network error: {message}")]
	Network { message: String },

	#[error("Call cancelled: {reason}")]
	Cancelled { reason: String },
}

/// Failures that will not succeed on retry
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PermanentError {
	#[error("Authentication failed: {reason}")]
	AuthenticationFailed { reason: String },

	#[error("Malformed request: {reason}")]
	MalformedRequest { reason: String },

	#[error("Schema rejected: {reason}")]
	SchemaRejected { reason: String },

	#[error("Capability '{capability}' not supported")]
	UnsupportedCapability { capability: String },

	#[error("HTTP {status_code}: {reason}")]
	ClientError { status_code: u16, reason: String },

	#[error("Invalid response format: {reason}")]
	InvalidResponse { reason: String },

	#[error("Configuration error: {reason}")]
	Configuration { reason: String },
}

/// Tagged result of a failed provider call
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", content = "error", rename_all = "snake_case")]
pub enum ProviderError {
	#[error("transient: {0}")]
	Transient(#[from] TransientError),

	#[error("permanent: {0}")]
	Permanent(#[from] PermanentError),
}

impl ProviderError {
	pub fn class(&self) -> ErrorClass {
		match self {
			ProviderError::Transient(_) => ErrorClass::Transient,
			ProviderError::Permanent(_) => ErrorClass::Permanent,
		}
	}

	pub fn is_transient(&self) -> bool {
		self.class().is_retriable()
	}

	pub fn is_timeout(&self) -> bool {
		matches!(
			self,
			ProviderError::Transient(TransientError::Timeout { .. })
		)
	}

	pub fn timeout(timeout_ms: u64) -> Self {
		TransientError::Timeout { timeout_ms }.into()
	}

	/// Classify a non-success HTTP status
	///
	/// 408, 429 and 5xx are transient; 401/403 are auth failures; 400, 404,
	/// 413 and 422 mean the request itself is wrong; anything else is a
	/// permanent client error.
	pub fn from_http_status(status_code: u16, body: impl Into<String>) -> Self {
		let reason = body.into();
		match status_code {
			408 => TransientError::Timeout { timeout_ms: 0 }.into(),
			429 => TransientError::RateLimited {
				retry_after_ms: None,
			}
			.into(),
			500..=599 => TransientError::ServerError {
				status_code,
				reason,
			}
			.into(),
			401 | 403 => PermanentError::AuthenticationFailed { reason }.into(),
			400 | 404 | 413 => PermanentError::MalformedRequest { reason }.into(),
			422 => PermanentError::SchemaRejected { reason }.into(),
			_ => PermanentError::ClientError {
				status_code,
				reason,
			}
			.into(),
		}
	}

	/// HTTP status carried by the error, if any
	pub fn status_code(&self) -> Option<u16> {
		match self {
			ProviderError::Transient(TransientError::ServerError { status_code, .. })
			| ProviderError::Permanent(PermanentError::ClientError { status_code, .. }) => {
				Some(*status_code)
			},
			ProviderError::Transient(TransientError::RateLimited { .. }) => Some(429),
			_ => None,
		}
	}
}

pub type ProviderResult<T> = Result<T, ProviderError>;
