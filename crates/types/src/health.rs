//! Read-only provider health snapshot for operational tooling

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::circuit_breaker::CircuitState;
use crate::providers::{Capability, ProviderIdentity};

/// Point-in-time health of one registered provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderHealth {
	pub identity: ProviderIdentity,
	pub capabilities: Vec<Capability>,
	pub circuit_state: CircuitState,
	/// Success rate over the health window, `None` when nothing was recorded
	pub recent_success_rate: Option<f64>,
	pub recent_avg_latency_ms: Option<f64>,
	pub recent_p95_latency_ms: Option<u64>,
	pub recent_cost_usd: f64,
	pub recent_requests: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub opened_at: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cooldown_deadline: Option<DateTime<Utc>>,
}

impl ProviderHealth {
	/// Whether the provider would be considered for fan-out at `now`
	pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
		if !self.identity.enabled {
			return false;
		}
		match self.circuit_state {
			CircuitState::Open => self.cooldown_deadline.is_some_and(|deadline| now >= deadline),
			CircuitState::Closed | CircuitState::HalfOpen => true,
		}
	}
}
