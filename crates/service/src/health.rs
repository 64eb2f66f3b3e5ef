//! Provider health snapshot assembled from breaker state and recent metrics

use crate::circuit_breaker::CircuitBreakerTrait;
use crate::providers::ProviderTable;
use chrono::Duration;
use llmo_types::{CircuitState, MetricsStore, ProviderHealth};
use tracing::warn;

/// Health of every registered provider, in rank order
///
/// A provider whose metrics cannot be read is still reported, with empty
/// recent statistics.
pub async fn collect_provider_health(
	table: &ProviderTable,
	breaker: &dyn CircuitBreakerTrait,
	metrics: &dyn MetricsStore,
	window: Duration,
) -> Vec<ProviderHealth> {
	let mut snapshot = Vec::with_capacity(table.len());

	for entry in table.iter() {
		let state = breaker.state(entry.name());
		let aggregate = match metrics.recent_aggregate(entry.name(), window).await {
			Ok(aggregate) => Some(aggregate).filter(|a| !a.is_empty()),
			Err(e) => {
				warn!("Failed to read metrics for provider '{}': {}", entry.name(), e);
				None
			},
		};

		snapshot.push(ProviderHealth {
			identity: entry.identity(),
			capabilities: entry.capabilities(),
			circuit_state: state
				.as_ref()
				.map(|s| s.state)
				.unwrap_or(CircuitState::Closed),
			recent_success_rate: aggregate.as_ref().map(|a| a.success_rate),
			recent_avg_latency_ms: aggregate.as_ref().map(|a| a.avg_response_time_ms),
			recent_p95_latency_ms: aggregate.as_ref().map(|a| a.p95_response_time_ms),
			recent_cost_usd: aggregate.as_ref().map(|a| a.total_cost_usd).unwrap_or(0.0),
			recent_requests: aggregate.as_ref().map(|a| a.total_requests).unwrap_or(0),
			opened_at: state.as_ref().and_then(|s| s.opened_at),
			cooldown_deadline: state.as_ref().and_then(|s| s.cooldown_deadline),
		});
	}

	snapshot
}
