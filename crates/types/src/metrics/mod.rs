//! Metrics collection and time-series types
//!
//! Every provider attempt produces one [`MetricsDataPoint`]. Points are kept
//! per provider in a [`MetricsTimeSeries`] that serves both the health snapshot
//! and the historical weighting of quality scores.

pub mod time_series;

pub use time_series::{
	MetricsAggregate, MetricsBucket, MetricsDataPoint, MetricsTimeSeries, TimeBucket, TimeRange,
};
