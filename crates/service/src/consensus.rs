//! Field-level majority vote across successful provider results
//!
//! Values are compared after normalization (trimmed, inner whitespace
//! collapsed, lowercased). A value wins when more than half of the providers
//! that returned a non-null value for the field agree on it; otherwise the
//! value of the highest-ranked provider that has one is used.

use crate::selection;
use llmo_types::constants::limits::CONSENSUS_MIN_RESULTS;
use llmo_types::{FieldResolution, ProviderCallResult, ProviderPayload};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Merged payload plus the per-field report
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusOutcome {
	pub payload: ProviderPayload,
	pub resolutions: BTreeMap<String, FieldResolution>,
	/// Mean agreement over resolved fields
	pub confidence: f64,
}

/// Comparison key for a field value
pub fn normalize(value: &Value) -> String {
	match value {
		Value::String(s) => s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase(),
		other => other.to_string().to_lowercase(),
	}
}

struct Group<'a> {
	value: &'a Value,
	votes: usize,
	confidence_sum: f64,
}

/// Vote every field across the successful results
///
/// Returns `None` when fewer than two results succeeded.
pub fn reduce(results: &[ProviderCallResult]) -> Option<ConsensusOutcome> {
	let ranked = selection::rank(results);
	if ranked.len() < CONSENSUS_MIN_RESULTS {
		return None;
	}

	let field_names: BTreeSet<&str> = ranked
		.iter()
		.filter_map(|r| r.payload.as_ref())
		.flat_map(|p| p.fields.keys().map(String::as_str))
		.collect();

	let mut payload = ProviderPayload::new();
	let mut resolutions = BTreeMap::new();

	for field in field_names {
		// Groups keep rank order of their first voter
		let mut groups: Vec<(String, Group<'_>)> = Vec::new();
		let mut voters = 0;

		for result in &ranked {
			let Some(result_payload) = result.payload.as_ref() else {
				continue;
			};
			let Some(value) = result_payload.value(field) else {
				continue;
			};
			voters += 1;
			let confidence = result_payload
				.confidence
				.get(field)
				.copied()
				.unwrap_or(0.0)
				.clamp(0.0, 1.0);
			let key = normalize(value);
			match groups.iter_mut().find(|(k, _)| *k == key) {
				Some((_, group)) => {
					group.votes += 1;
					group.confidence_sum += confidence;
				},
				None => groups.push((
					key,
					Group {
						value,
						votes: 1,
						confidence_sum: confidence,
					},
				)),
			}
		}

		if voters == 0 {
			payload.fields.insert(field.to_string(), Value::Null);
			continue;
		}

		let leader = groups
			.iter()
			.map(|(_, group)| group)
			.fold(None::<&Group<'_>>, |best, group| match best {
				Some(b) if b.votes >= group.votes => Some(b),
				_ => Some(group),
			});

		let resolution = match leader {
			Some(group) if group.votes * 2 > voters => {
				payload
					.confidence
					.insert(field.to_string(), group.confidence_sum / group.votes as f64);
				FieldResolution::Majority {
					value: group.value.clone(),
					votes: group.votes,
					voters,
				}
			},
			_ => {
				// First group holds the highest-ranked voter
				let (_, first) = &groups[0];
				let provider = ranked
					.iter()
					.find(|r| {
						r.payload
							.as_ref()
							.and_then(|p| p.value(field))
							.is_some()
					})
					.map(|r| r.provider.clone())
					.unwrap_or_default();
				payload
					.confidence
					.insert(field.to_string(), first.confidence_sum / first.votes as f64);
				FieldResolution::TieBreak {
					value: first.value.clone(),
					provider,
					voters,
				}
			},
		};

		payload
			.fields
			.insert(field.to_string(), resolution.value().clone());
		resolutions.insert(field.to_string(), resolution);
	}

	let confidence = if resolutions.is_empty() {
		0.0
	} else {
		resolutions.values().map(FieldResolution::agreement).sum::<f64>() / resolutions.len() as f64
	};

	Some(ConsensusOutcome {
		payload,
		resolutions,
		confidence,
	})
}
