//! Quality scoring of provider payloads
//!
//! A payload's score combines its self-reported confidence, how many required
//! fields it filled and whether it matches the requested schema:
//!
//! `0.5 * mean confidence + 0.3 * completeness + 0.2 * schema validity`
//!
//! A payload without a single extracted (non-null) field always scores 0.

use llmo_types::constants::limits::{
	QUALITY_COMPLETENESS_WEIGHT, QUALITY_CONFIDENCE_WEIGHT, QUALITY_SCHEMA_WEIGHT,
};
use llmo_types::{ProviderPayload, QualityScore, ResultSchema, SchemaViolation};

/// Checks a payload against the schema the caller asked for
pub struct SchemaValidator;

impl SchemaValidator {
	pub fn validate(payload: &ProviderPayload, schema: &ResultSchema) -> Vec<SchemaViolation> {
		let mut violations = Vec::new();

		if !payload.schema_valid {
			violations.push(SchemaViolation::ReportedInvalid);
		}

		for field in &schema.required_fields {
			if !payload.fields.contains_key(field) {
				violations.push(SchemaViolation::MissingRequired {
					field: field.clone(),
				});
			}
		}

		for (field, expected) in &schema.field_types {
			if let Some(value) = payload.value(field) {
				if !expected.matches(value) {
					violations.push(SchemaViolation::TypeMismatch {
						field: field.clone(),
						expected: format!("{:?}", expected).to_lowercase(),
					});
				}
			}
		}

		for (field, confidence) in &payload.confidence {
			if !(0.0..=1.0).contains(confidence) {
				violations.push(SchemaViolation::ConfidenceOutOfRange {
					field: field.clone(),
					value: *confidence,
				});
			}
		}

		violations
	}
}

/// Derives a [`QualityScore`] for every successful provider payload
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
	history_weight: f64,
}

impl QualityScorer {
	/// `history_weight` in [0, 1] blends in the provider's recent success rate
	pub fn new(history_weight: f64) -> Self {
		Self {
			history_weight: history_weight.clamp(0.0, 1.0),
		}
	}

	pub fn history_weight(&self) -> f64 {
		self.history_weight
	}

	pub fn uses_history(&self) -> bool {
		self.history_weight > 0.0
	}

	/// Score a payload on its own merits
	pub fn score(&self, payload: &ProviderPayload, schema: &ResultSchema) -> QualityScore {
		let violations = SchemaValidator::validate(payload, schema);
		let schema_valid = violations.is_empty();

		if !payload.has_extracted_fields() {
			return QualityScore {
				value: 0.0,
				confidence: 0.0,
				completeness: completeness(payload, schema),
				schema_valid,
				violations,
			};
		}

		let confidence = mean_confidence(payload);
		let completeness = completeness(payload, schema);
		let value = QUALITY_CONFIDENCE_WEIGHT * confidence
			+ QUALITY_COMPLETENESS_WEIGHT * completeness
			+ QUALITY_SCHEMA_WEIGHT * if schema_valid { 1.0 } else { 0.0 };

		QualityScore {
			value: value.clamp(0.0, 1.0),
			confidence,
			completeness,
			schema_valid,
			violations,
		}
	}

	/// Score a payload, blending in the provider's recent success rate
	///
	/// Without history (or with a zero weight) this equals [`Self::score`].
	pub fn score_with_history(
		&self,
		payload: &ProviderPayload,
		schema: &ResultSchema,
		recent_success_rate: Option<f64>,
	) -> QualityScore {
		let mut score = self.score(payload, schema);
		if let (true, Some(rate)) = (self.uses_history(), recent_success_rate) {
			if score.value > 0.0 {
				score.value = ((1.0 - self.history_weight) * score.value
					+ self.history_weight * rate.clamp(0.0, 1.0))
				.clamp(0.0, 1.0);
			}
		}
		score
	}
}

/// Mean confidence over non-null fields; missing entries count as 0
fn mean_confidence(payload: &ProviderPayload) -> f64 {
	let (sum, count) = payload
		.non_null_fields()
		.map(|field| {
			payload
				.confidence
				.get(field)
				.copied()
				.filter(|c| c.is_finite())
				.unwrap_or(0.0)
				.clamp(0.0, 1.0)
		})
		.fold((0.0, 0usize), |(sum, count), c| (sum + c, count + 1));

	if count == 0 {
		0.0
	} else {
		sum / count as f64
	}
}

/// Fraction of required fields carrying a non-null value (1.0 if none required)
fn completeness(payload: &ProviderPayload, schema: &ResultSchema) -> f64 {
	if schema.required_fields.is_empty() {
		return 1.0;
	}
	let filled = schema
		.required_fields
		.iter()
		.filter(|field| payload.value(field).is_some())
		.count();
	filled as f64 / schema.required_fields.len() as f64
}
