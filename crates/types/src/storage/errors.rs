//! Error types for storage operations

use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("I/O error on {path}: {message}")]
	Io { path: String, message: String },
	#[error("Serialization error: {message}")]
	Serialization { message: String },
	#[error("Corrupt record at line {line}: {message}")]
	CorruptRecord { line: usize, message: String },
	#[error("Storage operation failed: {message}")]
	Operation { message: String },
}

impl From<serde_json::Error> for StorageError {
	fn from(err: serde_json::Error) -> Self {
		StorageError::Serialization {
			message: err.to_string(),
		}
	}
}
