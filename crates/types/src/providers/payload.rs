//! Input and output payloads exchanged with providers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Known entity names handed to providers for disambiguation
///
/// Keys are entity kinds (e.g. "accounts", "people", "projects"), values are
/// the names already known to the workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationContext {
	#[serde(default)]
	pub known_entities: BTreeMap<String, Vec<String>>,
}

impl ClassificationContext {
	pub fn with_entities(
		mut self,
		kind: impl Into<String>,
		names: impl IntoIterator<Item = impl Into<String>>,
	) -> Self {
		self.known_entities
			.entry(kind.into())
			.or_default()
			.extend(names.into_iter().map(Into::into));
		self
	}

	pub fn is_empty(&self) -> bool {
		self.known_entities.values().all(Vec::is_empty)
	}
}

/// Expected JSON type of an extracted field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
	String,
	Number,
	Boolean,
	Array,
	Object,
}

impl FieldType {
	/// Whether a non-null JSON value has this type
	pub fn matches(&self, value: &Value) -> bool {
		match self {
			FieldType::String => value.is_string(),
			FieldType::Number => value.is_number(),
			FieldType::Boolean => value.is_boolean(),
			FieldType::Array => value.is_array(),
			FieldType::Object => value.is_object(),
		}
	}
}

/// Shape the caller expects back from a provider
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultSchema {
	/// Fields that must be present; completeness counts how many are non-null
	#[serde(default)]
	pub required_fields: Vec<String>,
	/// Optional expected type per field (required or not)
	#[serde(default)]
	pub field_types: BTreeMap<String, FieldType>,
}

impl ResultSchema {
	pub fn required(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			required_fields: fields.into_iter().map(Into::into).collect(),
			field_types: BTreeMap::new(),
		}
	}

	pub fn with_type(mut self, field: impl Into<String>, field_type: FieldType) -> Self {
		self.field_types.insert(field.into(), field_type);
		self
	}
}

/// Everything a provider receives for one call
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderInput {
	/// Normalized text blob produced by the upstream content pipeline
	pub text: String,
	#[serde(default)]
	pub context: ClassificationContext,
	#[serde(default)]
	pub schema: ResultSchema,
}

impl ProviderInput {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			..Default::default()
		}
	}

	pub fn with_context(mut self, context: ClassificationContext) -> Self {
		self.context = context;
		self
	}

	pub fn with_schema(mut self, schema: ResultSchema) -> Self {
		self.schema = schema;
		self
	}
}

/// Structured result returned by a provider
///
/// `fields` holds the extracted values (null means "looked for, not found"),
/// `confidence` the provider's self-reported confidence per field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderPayload {
	#[serde(default)]
	pub fields: BTreeMap<String, Value>,
	#[serde(default)]
	pub confidence: BTreeMap<String, f64>,
	/// Set to false when the provider itself reports its output as off-schema
	#[serde(default = "default_true")]
	pub schema_valid: bool,
}

fn default_true() -> bool {
	true
}

impl ProviderPayload {
	pub fn new() -> Self {
		Self {
			fields: BTreeMap::new(),
			confidence: BTreeMap::new(),
			schema_valid: true,
		}
	}

	pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.fields.insert(name.into(), value.into());
		self
	}

	pub fn with_confidence(mut self, name: impl Into<String>, confidence: f64) -> Self {
		self.confidence.insert(name.into(), confidence);
		self
	}

	pub fn with_schema_valid(mut self, valid: bool) -> Self {
		self.schema_valid = valid;
		self
	}

	/// Value of a field, treating JSON null as absent
	pub fn value(&self, name: &str) -> Option<&Value> {
		self.fields.get(name).filter(|v| !v.is_null())
	}

	/// Names of fields carrying a non-null value
	pub fn non_null_fields(&self) -> impl Iterator<Item = &str> {
		self.fields
			.iter()
			.filter(|(_, v)| !v.is_null())
			.map(|(k, _)| k.as_str())
	}

	pub fn has_extracted_fields(&self) -> bool {
		self.non_null_fields().next().is_some()
	}
}

/// Token accounting reported by a provider for one call
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenUsage {
	pub input_tokens: u32,
	pub output_tokens: u32,
	/// Estimated cost in USD
	pub cost_usd: f64,
}

impl TokenUsage {
	pub fn total_tokens(&self) -> u32 {
		self.input_tokens.saturating_add(self.output_tokens)
	}
}

impl std::ops::Add for TokenUsage {
	type Output = TokenUsage;

	fn add(self, rhs: TokenUsage) -> TokenUsage {
		TokenUsage {
			input_tokens: self.input_tokens.saturating_add(rhs.input_tokens),
			output_tokens: self.output_tokens.saturating_add(rhs.output_tokens),
			cost_usd: self.cost_usd + rhs.cost_usd,
		}
	}
}

/// Successful provider response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderResponse {
	pub payload: ProviderPayload,
	#[serde(default)]
	pub usage: TokenUsage,
}

impl ProviderResponse {
	pub fn new(payload: ProviderPayload) -> Self {
		Self {
			payload,
			usage: TokenUsage::default(),
		}
	}

	pub fn with_usage(mut self, usage: TokenUsage) -> Self {
		self.usage = usage;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_null_fields_are_not_extracted() {
		let payload = ProviderPayload::new()
			.with_field("name", "Acme")
			.with_field("date", Value::Null);

		assert_eq!(payload.value("name"), Some(&json!("Acme")));
		assert_eq!(payload.value("date"), None);
		assert_eq!(payload.non_null_fields().collect::<Vec<_>>(), vec!["name"]);
		assert!(payload.has_extracted_fields());
	}

	#[test]
	fn test_token_usage_saturates_instead_of_overflowing() {
		let huge = TokenUsage {
			input_tokens: u32::MAX - 1,
			output_tokens: 10,
			cost_usd: 1.0,
		};

		assert_eq!(huge.total_tokens(), u32::MAX);
		let sum = huge + huge;
		assert_eq!(sum.input_tokens, u32::MAX);
		assert_eq!(sum.output_tokens, 20);
		assert_eq!(sum.cost_usd, 2.0);
	}

	#[test]
	fn test_empty_payload_has_no_extracted_fields() {
		let payload = ProviderPayload::new().with_field("date", Value::Null);
		assert!(!payload.has_extracted_fields());
	}

	#[test]
	fn test_payload_deserializes_with_defaults() {
		let payload: ProviderPayload =
			serde_json::from_value(json!({ "fields": { "name": "Acme" } })).unwrap();
		assert!(payload.schema_valid);
		assert!(payload.confidence.is_empty());
	}

	#[test]
	fn test_field_type_matching() {
		assert!(FieldType::String.matches(&json!("x")));
		assert!(!FieldType::String.matches(&json!(1)));
		assert!(FieldType::Number.matches(&json!(1.5)));
		assert!(FieldType::Array.matches(&json!(["a"])));
		assert!(FieldType::Object.matches(&json!({"a": 1})));
		assert!(FieldType::Boolean.matches(&json!(false)));
	}

	#[test]
	fn test_context_builder_merges_entities() {
		let context = ClassificationContext::default()
			.with_entities("accounts", ["Acme"])
			.with_entities("accounts", ["Globex"]);
		assert_eq!(
			context.known_entities["accounts"],
			vec!["Acme".to_string(), "Globex".to_string()]
		);
		assert!(!context.is_empty());
	}

	#[test]
	fn test_usage_addition() {
		let total = TokenUsage {
			input_tokens: 10,
			output_tokens: 5,
			cost_usd: 0.01,
		} + TokenUsage {
			input_tokens: 1,
			output_tokens: 2,
			cost_usd: 0.02,
		};
		assert_eq!(total.total_tokens(), 18);
		assert!((total.cost_usd - 0.03).abs() < 1e-9);
	}
}
