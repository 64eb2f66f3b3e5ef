//! Time-series data structures for provider metrics storage and analysis

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::providers::{Capability, ErrorClass, ProviderError, TokenUsage};

/// Coefficient for p95 approximation: p95 ≈ median + COEFF * (max - median)
///
/// LLM latencies are right-skewed, so a median-based estimate tracks the tail
/// better than a mean-based one.
const P95_MEDIAN_COEFFICIENT: f64 = 1.3;

/// Learning rate of the incremental median estimate
const MEDIAN_LEARNING_RATE: f64 = 0.1;

/// Metrics data point for a single provider attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsDataPoint {
	/// Provider the attempt was made against
	pub provider: String,
	/// Timestamp when the metric was recorded
	pub timestamp: DateTime<Utc>,
	/// Capability that was requested
	pub capability: Capability,
	/// Attempt number within the logical call (1-based)
	pub attempt: u32,
	/// Response time in milliseconds
	pub response_time_ms: u64,
	/// Whether the attempt was successful
	pub was_successful: bool,
	/// Whether the attempt timed out or was cut off by the request deadline
	pub was_timeout: bool,
	/// Error classification for failed attempts
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_class: Option<ErrorClass>,
	#[serde(default)]
	pub input_tokens: u32,
	#[serde(default)]
	pub output_tokens: u32,
	/// Estimated cost in USD
	#[serde(default)]
	pub cost_usd: f64,
}

impl MetricsDataPoint {
	/// Data point for a successful attempt
	pub fn success(
		provider: impl Into<String>,
		capability: Capability,
		attempt: u32,
		response_time_ms: u64,
	) -> Self {
		Self {
			provider: provider.into(),
			timestamp: Utc::now(),
			capability,
			attempt,
			response_time_ms,
			was_successful: true,
			was_timeout: false,
			error_class: None,
			input_tokens: 0,
			output_tokens: 0,
			cost_usd: 0.0,
		}
	}

	/// Data point for a failed attempt, classified from the provider error
	pub fn failure(
		provider: impl Into<String>,
		capability: Capability,
		attempt: u32,
		response_time_ms: u64,
		error: &ProviderError,
	) -> Self {
		Self {
			was_successful: false,
			was_timeout: error.is_timeout(),
			error_class: Some(error.class()),
			..Self::success(provider, capability, attempt, response_time_ms)
		}
	}

	pub fn with_usage(mut self, usage: &TokenUsage) -> Self {
		self.input_tokens = usage.input_tokens;
		self.output_tokens = usage.output_tokens;
		self.cost_usd = usage.cost_usd;
		self
	}

	pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = timestamp;
		self
	}
}

/// Aggregated metrics for a specific time period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsAggregate {
	/// Time period this aggregate covers
	pub time_range: TimeRange,
	pub total_requests: u64,
	pub successful_requests: u64,
	pub failed_requests: u64,
	pub timeout_requests: u64,
	/// Failures classified as transient (timeouts, rate limits, 5xx)
	pub transient_errors: u64,
	/// Failures classified as permanent (auth, malformed, schema)
	pub permanent_errors: u64,
	/// Average response time in milliseconds
	pub avg_response_time_ms: f64,
	/// Estimated median response time in milliseconds
	pub median_response_time_ms: f64,
	pub min_response_time_ms: u64,
	pub max_response_time_ms: u64,
	/// Approximate 95th percentile response time in milliseconds
	pub p95_response_time_ms: u64,
	/// Success rate (0.0 to 1.0)
	pub success_rate: f64,
	pub total_input_tokens: u64,
	pub total_output_tokens: u64,
	pub total_cost_usd: f64,
	/// When this aggregate was last updated
	pub last_updated: DateTime<Utc>,
}

impl MetricsAggregate {
	/// Create an empty aggregate for a time range
	pub fn new(time_range: TimeRange) -> Self {
		Self {
			time_range,
			total_requests: 0,
			successful_requests: 0,
			failed_requests: 0,
			timeout_requests: 0,
			transient_errors: 0,
			permanent_errors: 0,
			avg_response_time_ms: 0.0,
			median_response_time_ms: 0.0,
			min_response_time_ms: u64::MAX,
			max_response_time_ms: 0,
			p95_response_time_ms: 0,
			success_rate: 0.0,
			total_input_tokens: 0,
			total_output_tokens: 0,
			total_cost_usd: 0.0,
			last_updated: Utc::now(),
		}
	}

	/// Build an aggregate over a set of data points
	pub fn from_points<'a>(
		time_range: TimeRange,
		points: impl IntoIterator<Item = &'a MetricsDataPoint>,
	) -> Self {
		let mut aggregate = Self::new(time_range);
		for point in points {
			aggregate.add_data_point(point);
		}
		aggregate
	}

	/// Add a data point to this aggregate
	pub fn add_data_point(&mut self, point: &MetricsDataPoint) {
		let old_total = self.total_requests;
		self.total_requests += 1;

		if point.was_successful {
			self.successful_requests += 1;
		} else {
			self.failed_requests += 1;
		}

		if point.was_timeout {
			self.timeout_requests += 1;
		}

		match point.error_class {
			Some(ErrorClass::Transient) => self.transient_errors += 1,
			Some(ErrorClass::Permanent) => self.permanent_errors += 1,
			None => {},
		}

		// Welford's online mean: new_avg = old_avg + (new_value - old_avg) / new_count
		let value = point.response_time_ms as f64;
		if old_total == 0 {
			self.avg_response_time_ms = value;
			self.median_response_time_ms = value;
		} else {
			let delta = value - self.avg_response_time_ms;
			self.avg_response_time_ms += delta / self.total_requests as f64;
			self.median_response_time_ms +=
				MEDIAN_LEARNING_RATE * (value - self.median_response_time_ms);
		}

		self.min_response_time_ms = self.min_response_time_ms.min(point.response_time_ms);
		self.max_response_time_ms = self.max_response_time_ms.max(point.response_time_ms);

		self.success_rate = self.successful_requests as f64 / self.total_requests as f64;
		self.p95_response_time_ms = self.calculate_p95_approximation();

		self.total_input_tokens += u64::from(point.input_tokens);
		self.total_output_tokens += u64::from(point.output_tokens);
		self.total_cost_usd += point.cost_usd;

		self.last_updated = Utc::now();
	}

	/// Check if this aggregate is empty (no data points)
	pub fn is_empty(&self) -> bool {
		self.total_requests == 0
	}

	/// Minimum response time, or 0 when empty
	pub fn min_response_time(&self) -> u64 {
		if self.is_empty() {
			0
		} else {
			self.min_response_time_ms
		}
	}

	fn calculate_p95_approximation(&self) -> u64 {
		if self.total_requests == 0 {
			return 0;
		}

		if self.total_requests == 1 || self.min_response_time_ms == self.max_response_time_ms {
			return self.max_response_time_ms;
		}

		let max_ms = self.max_response_time_ms as f64;
		let min_ms = self.min_response_time_ms as f64;
		let clamped_median = self.median_response_time_ms.max(min_ms).min(max_ms);

		let p95_estimate = clamped_median + P95_MEDIAN_COEFFICIENT * (max_ms - clamped_median);
		p95_estimate.max(clamped_median).min(max_ms) as u64
	}
}

/// Time range representation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeRange {
	/// Start of the time range (inclusive)
	pub start: DateTime<Utc>,
	/// End of the time range (exclusive)
	pub end: DateTime<Utc>,
}

impl TimeRange {
	pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
		Self { start, end }
	}

	/// Range covering the last `duration` up to now
	pub fn last(duration: Duration) -> Self {
		let end = Utc::now();
		Self::new(end - duration, end)
	}

	/// Check if a timestamp falls within this range
	pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
		timestamp >= self.start && timestamp < self.end
	}

	pub fn duration(&self) -> Duration {
		self.end - self.start
	}

	/// Create a time range for a specific hour
	pub fn for_hour(datetime: DateTime<Utc>) -> Self {
		let start = datetime
			.with_minute(0)
			.and_then(|dt| dt.with_second(0))
			.and_then(|dt| dt.with_nanosecond(0))
			.unwrap_or(datetime);
		Self::new(start, start + Duration::hours(1))
	}

	fn truncate_to_minute(datetime: DateTime<Utc>, minute: u32) -> DateTime<Utc> {
		datetime
			.with_minute(minute)
			.and_then(|dt| dt.with_second(0))
			.and_then(|dt| dt.with_nanosecond(0))
			.unwrap_or(datetime)
	}
}

/// Time bucket granularity for aggregating metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeBucket {
	FiveMinutes,
	Hourly,
}

impl TimeBucket {
	pub fn duration(&self) -> Duration {
		match self {
			TimeBucket::FiveMinutes => Duration::minutes(5),
			TimeBucket::Hourly => Duration::hours(1),
		}
	}

	/// Get the time range for the bucket containing the given timestamp
	pub fn bucket_for(&self, timestamp: DateTime<Utc>) -> TimeRange {
		match self {
			TimeBucket::FiveMinutes => {
				let bucket_start_minute = (timestamp.minute() / 5) * 5;
				let start = TimeRange::truncate_to_minute(timestamp, bucket_start_minute);
				TimeRange::new(start, start + self.duration())
			},
			TimeBucket::Hourly => TimeRange::for_hour(timestamp),
		}
	}
}

/// A bounded collection of aggregates organized in time buckets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsBucket {
	pub bucket_type: TimeBucket,
	pub aggregates: BTreeMap<TimeRange, MetricsAggregate>,
	/// Maximum number of buckets to keep
	pub max_buckets: usize,
}

impl MetricsBucket {
	pub fn new(bucket_type: TimeBucket, max_buckets: usize) -> Self {
		Self {
			bucket_type,
			aggregates: BTreeMap::new(),
			max_buckets,
		}
	}

	/// Add a data point to the appropriate time bucket
	pub fn add_data_point(&mut self, point: &MetricsDataPoint) {
		let time_range = self.bucket_type.bucket_for(point.timestamp);

		self.aggregates
			.entry(time_range.clone())
			.or_insert_with(|| MetricsAggregate::new(time_range))
			.add_data_point(point);

		while self.aggregates.len() > self.max_buckets {
			if self.aggregates.pop_first().is_none() {
				break;
			}
		}
	}

	pub fn get_latest(&self) -> Option<&MetricsAggregate> {
		self.aggregates.values().next_back()
	}

	pub fn is_empty(&self) -> bool {
		self.aggregates.is_empty()
	}
}

/// Complete time-series storage for one provider
///
/// Keeps a bounded window of raw data points for exact recent-window queries,
/// plus 5-minute (24h) and hourly (7d) buckets for longer-range reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsTimeSeries {
	pub provider: String,
	/// Most recent raw points, oldest first
	pub recent_points: VecDeque<MetricsDataPoint>,
	pub max_recent_points: usize,
	pub five_minute_buckets: MetricsBucket,
	pub hourly_buckets: MetricsBucket,
	/// Totals since the series was created
	pub lifetime_requests: u64,
	pub lifetime_cost_usd: f64,
	pub created_at: DateTime<Utc>,
	pub last_updated: DateTime<Utc>,
}

impl MetricsTimeSeries {
	pub fn new(provider: impl Into<String>, max_recent_points: usize) -> Self {
		let now = Utc::now();
		Self {
			provider: provider.into(),
			recent_points: VecDeque::new(),
			max_recent_points: max_recent_points.max(1),
			// 288 five-minute buckets = 24 hours
			five_minute_buckets: MetricsBucket::new(TimeBucket::FiveMinutes, 288),
			// 168 hourly buckets = 7 days
			hourly_buckets: MetricsBucket::new(TimeBucket::Hourly, 168),
			lifetime_requests: 0,
			lifetime_cost_usd: 0.0,
			created_at: now,
			last_updated: now,
		}
	}

	/// Add a data point to the raw window and all buckets
	pub fn add_data_point(&mut self, point: MetricsDataPoint) {
		self.five_minute_buckets.add_data_point(&point);
		self.hourly_buckets.add_data_point(&point);
		self.lifetime_requests += 1;
		self.lifetime_cost_usd += point.cost_usd;

		if self.recent_points.len() == self.max_recent_points {
			self.recent_points.pop_front();
		}
		self.recent_points.push_back(point);
		self.last_updated = Utc::now();
	}

	/// Exact aggregate over the raw points recorded within the last `window`
	pub fn aggregate_recent(&self, window: Duration) -> MetricsAggregate {
		let range = TimeRange::last(window);
		MetricsAggregate::from_points(
			range.clone(),
			self.recent_points
				.iter()
				.filter(|point| point.timestamp >= range.start),
		)
	}

	/// Raw points recorded at or after `since`
	pub fn points_since(&self, since: DateTime<Utc>) -> Vec<MetricsDataPoint> {
		self.recent_points
			.iter()
			.filter(|point| point.timestamp >= since)
			.cloned()
			.collect()
	}
}
