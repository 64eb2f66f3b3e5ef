//! In-memory metrics store using DashMap, one entry per provider

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use llmo_types::constants::limits::DEFAULT_MAX_POINTS_PER_PROVIDER;
use llmo_types::metrics::TimeRange;
use llmo_types::{
	MetricsAggregate, MetricsDataPoint, MetricsStore, MetricsTimeSeries, StorageResult,
	StorageStats,
};
use std::sync::Arc;
use tracing::debug;

/// In-memory per-provider metrics time series
///
/// Appends only lock the provider's own entry, so requests against different
/// providers never contend.
#[derive(Debug, Clone)]
pub struct MemoryMetricsStore {
	series: Arc<DashMap<String, MetricsTimeSeries>>,
	max_points_per_provider: usize,
}

impl MemoryMetricsStore {
	pub fn new() -> Self {
		Self::with_max_points(DEFAULT_MAX_POINTS_PER_PROVIDER)
	}

	/// Bound the raw point window kept per provider
	pub fn with_max_points(max_points_per_provider: usize) -> Self {
		Self {
			series: Arc::new(DashMap::new()),
			max_points_per_provider,
		}
	}

	/// Synchronous append, shared with the durable store's replay path
	pub fn record(&self, point: MetricsDataPoint) {
		self.series
			.entry(point.provider.clone())
			.or_insert_with(|| {
				debug!("Creating metrics time series for provider {}", point.provider);
				MetricsTimeSeries::new(point.provider.clone(), self.max_points_per_provider)
			})
			.add_data_point(point);
	}

	pub fn provider_count(&self) -> usize {
		self.series.len()
	}
}

impl Default for MemoryMetricsStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl MetricsStore for MemoryMetricsStore {
	async fn append(&self, point: MetricsDataPoint) -> StorageResult<()> {
		self.record(point);
		Ok(())
	}

	async fn recent_aggregate(
		&self,
		provider: &str,
		window: Duration,
	) -> StorageResult<MetricsAggregate> {
		Ok(match self.series.get(provider) {
			Some(series) => series.aggregate_recent(window),
			None => MetricsAggregate::new(TimeRange::last(window)),
		})
	}

	async fn points_since(
		&self,
		provider: &str,
		since: DateTime<Utc>,
	) -> StorageResult<Vec<MetricsDataPoint>> {
		Ok(self
			.series
			.get(provider)
			.map(|series| series.points_since(since))
			.unwrap_or_default())
	}

	async fn time_series(&self, provider: &str) -> StorageResult<Option<MetricsTimeSeries>> {
		Ok(self.series.get(provider).map(|series| series.clone()))
	}

	async fn health_check(&self) -> StorageResult<bool> {
		Ok(true)
	}

	async fn stats(&self) -> StorageResult<StorageStats> {
		Ok(StorageStats {
			providers: self.series.len(),
			total_points: self
				.series
				.iter()
				.map(|entry| entry.value().lifetime_requests)
				.sum(),
		})
	}
}
