//! Provider domain model
//!
//! A provider is one interchangeable LLM backend able to extract, classify or
//! summarize. Providers are registered once at startup from configuration and
//! are addressed by their identity everywhere else in the system.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod call_result;
pub mod errors;
pub mod payload;
pub mod traits;

pub use call_result::*;
pub use errors::*;
pub use payload::*;
pub use traits::*;

/// Work a provider can be asked to perform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
	/// Pull structured fields out of free text
	Extract,
	/// Assign the text to one or more known categories/entities
	Classify,
	/// Produce a condensed representation of the text
	Summarize,
}

impl Capability {
	/// All capabilities, in declaration order
	pub const ALL: [Capability; 3] = [
		Capability::Extract,
		Capability::Classify,
		Capability::Summarize,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Capability::Extract => "extract",
			Capability::Classify => "classify",
			Capability::Summarize => "summarize",
		}
	}
}

impl fmt::Display for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl std::str::FromStr for Capability {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"extract" => Ok(Capability::Extract),
			"classify" => Ok(Capability::Classify),
			"summarize" => Ok(Capability::Summarize),
			other => Err(format!("unknown capability '{}'", other)),
		}
	}
}

/// Immutable identity of a registered provider
///
/// `enabled` is the only field that changes after startup, and only through
/// the operator kill-switch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProviderIdentity {
	/// Unique provider name, also the registry key
	pub name: String,
	/// Lower rank is preferred (failover order, tie-breaks)
	pub priority: u32,
	/// Operator kill-switch state
	pub enabled: bool,
}

impl ProviderIdentity {
	pub fn new(name: impl Into<String>, priority: u32) -> Self {
		Self {
			name: name.into(),
			priority,
			enabled: true,
		}
	}

	pub fn disabled(mut self) -> Self {
		self.enabled = false;
		self
	}

	/// Ordering key used wherever providers are ranked: priority, then name
	pub fn rank_key(&self) -> (u32, &str) {
		(self.priority, self.name.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_capability_round_trips_through_str() {
		for capability in Capability::ALL {
			let parsed: Capability = capability.as_str().parse().unwrap();
			assert_eq!(parsed, capability);
		}
		assert!("translate".parse::<Capability>().is_err());
	}

	#[test]
	fn test_capability_serializes_lowercase() {
		assert_eq!(
			serde_json::to_string(&Capability::Summarize).unwrap(),
			"\"summarize\""
		);
	}

	#[test]
	fn test_rank_key_orders_by_priority_then_name() {
		let mut providers = vec![
			ProviderIdentity::new("zeta", 1),
			ProviderIdentity::new("alpha", 2),
			ProviderIdentity::new("beta", 1),
		];
		providers.sort_by(|a, b| a.rank_key().cmp(&b.rank_key()));
		let names: Vec<_> = providers.iter().map(|p| p.name.as_str()).collect();
		assert_eq!(names, vec!["beta", "zeta", "alpha"]);
	}

	#[test]
	fn test_new_identity_is_enabled() {
		let identity = ProviderIdentity::new("primary", 0);
		assert!(identity.enabled);
		assert!(!identity.disabled().enabled);
	}
}
