//! Storage traits for pluggable metrics backends

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::StorageResult;
use crate::metrics::{MetricsAggregate, MetricsDataPoint, MetricsTimeSeries};

/// Statistics about storage usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
	pub providers: usize,
	pub total_points: u64,
}

/// Append-only store of per-attempt provider metrics
///
/// Appends are per provider entry so concurrent requests against different
/// providers never contend.
#[async_trait]
pub trait MetricsStore: Send + Sync + std::fmt::Debug {
	/// Append one attempt outcome
	async fn append(&self, point: MetricsDataPoint) -> StorageResult<()>;

	/// Aggregate of a provider's points recorded within the last `window`
	async fn recent_aggregate(
		&self,
		provider: &str,
		window: Duration,
	) -> StorageResult<MetricsAggregate>;

	/// Raw points recorded at or after `since`
	async fn points_since(
		&self,
		provider: &str,
		since: DateTime<Utc>,
	) -> StorageResult<Vec<MetricsDataPoint>>;

	/// Full time series for a provider, if any point has been recorded
	async fn time_series(&self, provider: &str) -> StorageResult<Option<MetricsTimeSeries>>;

	/// Health check for the storage backend
	async fn health_check(&self) -> StorageResult<bool>;

	async fn stats(&self) -> StorageResult<StorageStats>;

	/// Flush buffered data. Default implementation does nothing.
	async fn flush(&self) -> StorageResult<()> {
		Ok(())
	}
}
