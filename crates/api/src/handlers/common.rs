use serde::{Deserialize, Serialize};

/// Error response format shared by handlers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
	pub timestamp: i64,
}

impl ErrorResponse {
	pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			message: message.into(),
			timestamp: chrono::Utc::now().timestamp(),
		}
	}
}
