//! Quality score attached to a single provider result

use serde::{Deserialize, Serialize};

/// A problem found while validating a payload against its schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaViolation {
	/// A required field key is absent from the payload
	MissingRequired { field: String },
	/// A non-null value does not have the declared type
	TypeMismatch { field: String, expected: String },
	/// A confidence value lies outside [0, 1]
	ConfidenceOutOfRange { field: String, value: f64 },
	/// The provider flagged its own output as off-schema
	ReportedInvalid,
}

/// Derived quality of one result, in [0.0, 1.0]
///
/// `value = 0.5 * confidence + 0.3 * completeness + 0.2 * schema`, floored to
/// 0.0 when the payload carries no extracted field at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityScore {
	pub value: f64,
	/// Mean per-field confidence over extracted fields
	pub confidence: f64,
	/// Fraction of required fields that are non-null
	pub completeness: f64,
	pub schema_valid: bool,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub violations: Vec<SchemaViolation>,
}

impl QualityScore {
	pub fn zero() -> Self {
		Self {
			value: 0.0,
			confidence: 0.0,
			completeness: 0.0,
			schema_valid: false,
			violations: Vec::new(),
		}
	}
}
