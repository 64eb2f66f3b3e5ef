//! Orchestration request, result and error types
//!
//! An [`OrchestrationRequest`] is the unit of work handed to the orchestrator;
//! an [`OrchestrationResult`] is the single decision it returns.

pub mod errors;
pub mod request;
pub mod result;

pub use errors::*;
pub use request::*;
pub use result::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the orchestrator reduces provider results into one decision
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
	/// Sequential by priority, first success wins
	#[default]
	Failover,
	/// Parallel, highest quality score wins
	BestMatch,
	/// Parallel, per-field majority vote
	Consensus,
	/// Parallel, every result returned without reduction
	AllProviders,
}

impl Strategy {
	pub fn as_str(&self) -> &'static str {
		match self {
			Strategy::Failover => "failover",
			Strategy::BestMatch => "best_match",
			Strategy::Consensus => "consensus",
			Strategy::AllProviders => "all_providers",
		}
	}

	/// Whether the strategy fans out to all eligible providers at once
	pub fn is_parallel(&self) -> bool {
		!matches!(self, Strategy::Failover)
	}
}

impl fmt::Display for Strategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for Strategy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().replace('-', "_").as_str() {
			"failover" => Ok(Strategy::Failover),
			"best_match" | "bestmatch" => Ok(Strategy::BestMatch),
			"consensus" => Ok(Strategy::Consensus),
			"all_providers" | "all" => Ok(Strategy::AllProviders),
			other => Err(format!("unknown strategy '{}'", other)),
		}
	}
}
