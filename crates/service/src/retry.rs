//! Exponential backoff for provider calls
//!
//! Delay before attempt `n + 1` is `base * 2^(n - 1)`, capped at `max_delay`,
//! optionally spread by up to ±20% jitter. Only transient errors are retried.

use llmo_config::RetrySettings;
use llmo_types::constants::limits::{
	DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_DELAY_MS,
	MAX_RETRY_JITTER_RATIO,
};
use llmo_types::{ProviderError, TransientError};
use rand::Rng;
use std::time::Duration;

/// Decision taken after one failed attempt of a logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
	/// Attempt that just failed (1-based)
	pub attempt: u32,
	/// Delay before the next attempt
	pub delay: Duration,
	/// Whether the triggering error is retriable at all
	pub retriable: bool,
}

impl RetryAttempt {
	/// Whether another attempt should follow
	pub fn should_retry(&self) -> bool {
		self.retriable
	}
}

/// Stateless backoff calculator
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
	max_attempts: u32,
	base_delay: Duration,
	max_delay: Duration,
	jitter_ratio: f64,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new(
			DEFAULT_RETRY_MAX_ATTEMPTS,
			Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
			Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
		)
	}
}

impl From<&RetrySettings> for RetryPolicy {
	fn from(settings: &RetrySettings) -> Self {
		Self::new(
			settings.max_attempts,
			Duration::from_millis(settings.base_delay_ms),
			Duration::from_millis(settings.max_delay_ms),
		)
		.with_jitter(settings.jitter_ratio)
	}
}

impl RetryPolicy {
	pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
		Self {
			max_attempts: max_attempts.max(1),
			base_delay,
			max_delay: max_delay.max(base_delay),
			jitter_ratio: 0.0,
		}
	}

	/// Single attempt, no retries
	pub fn no_retry() -> Self {
		Self::new(1, Duration::ZERO, Duration::ZERO)
	}

	pub fn with_jitter(mut self, ratio: f64) -> Self {
		self.jitter_ratio = ratio.clamp(0.0, MAX_RETRY_JITTER_RATIO);
		self
	}

	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	/// Un-jittered delay after the given failed attempt: `base * 2^(attempt - 1)`
	pub fn next_delay(&self, attempt: u32) -> Duration {
		let exponent = attempt.saturating_sub(1).min(20);
		self.base_delay
			.saturating_mul(1u32 << exponent)
			.min(self.max_delay)
	}

	/// Delay with jitter applied and rate-limit hints honoured
	pub fn delay_for(&self, attempt: u32, error: &ProviderError) -> Duration {
		let mut delay = self.next_delay(attempt);

		if self.jitter_ratio > 0.0 && !delay.is_zero() {
			let spread = rand::rng().random_range(-self.jitter_ratio..=self.jitter_ratio);
			delay = delay.mul_f64(1.0 + spread);
		}

		if let ProviderError::Transient(TransientError::RateLimited {
			retry_after_ms: Some(retry_after_ms),
		}) = error
		{
			delay = delay.max(Duration::from_millis(*retry_after_ms));
		}

		delay.min(self.max_delay.mul_f64(1.0 + self.jitter_ratio))
	}

	/// Whether a failure on `attempt` should be followed by another attempt
	pub fn should_retry(&self, attempt: u32, error: &ProviderError) -> bool {
		error.is_transient() && attempt < self.max_attempts
	}

	/// Plan what follows a failed attempt
	pub fn plan(&self, attempt: u32, error: &ProviderError) -> RetryAttempt {
		let retriable = self.should_retry(attempt, error);
		RetryAttempt {
			attempt,
			delay: if retriable {
				self.delay_for(attempt, error)
			} else {
				Duration::ZERO
			},
			retriable,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use llmo_types::PermanentError;

	fn server_error() -> ProviderError {
		TransientError::ServerError {
			status_code: 503,
			reason: "unavailable".into(),
		}
		.into()
	}

	#[test]
	fn test_default_schedule_doubles() {
		let policy = RetryPolicy::default();
		assert_eq!(policy.next_delay(1), Duration::from_secs(1));
		assert_eq!(policy.next_delay(2), Duration::from_secs(2));
		assert_eq!(policy.next_delay(3), Duration::from_secs(4));
		assert_eq!(policy.next_delay(4), Duration::from_secs(8));
		assert_eq!(policy.next_delay(9), Duration::from_secs(8), "capped at max_delay");
	}

	#[test]
	fn test_retry_bound() {
		let policy = RetryPolicy::default();
		let err = server_error();
		assert!(policy.should_retry(1, &err));
		assert!(policy.should_retry(2, &err));
		assert!(!policy.should_retry(3, &err));
	}

	#[test]
	fn test_permanent_errors_short_circuit() {
		let policy = RetryPolicy::default();
		let err: ProviderError = PermanentError::AuthenticationFailed {
			reason: "bad key".into(),
		}
		.into();
		let plan = policy.plan(1, &err);
		assert!(!plan.should_retry());
		assert_eq!(plan.delay, Duration::ZERO);
	}

	#[test]
	fn test_jitter_stays_within_twenty_percent() {
		let policy = RetryPolicy::new(5, Duration::from_millis(1000), Duration::from_secs(8))
			.with_jitter(0.5);
		let err = server_error();
		for _ in 0..200 {
			let delay = policy.delay_for(2, &err);
			assert!(delay >= Duration::from_millis(1600), "{:?}", delay);
			assert!(delay <= Duration::from_millis(2400), "{:?}", delay);
		}
	}

	#[test]
	fn test_rate_limit_hint_extends_delay() {
		let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(5));
		let err: ProviderError = TransientError::RateLimited {
			retry_after_ms: Some(2_000),
		}
		.into();
		assert_eq!(policy.delay_for(1, &err), Duration::from_secs(2));

		let huge: ProviderError = TransientError::RateLimited {
			retry_after_ms: Some(60_000),
		}
		.into();
		assert_eq!(policy.delay_for(1, &huge), Duration::from_secs(5));
	}

	#[test]
	fn test_from_settings() {
		let settings = RetrySettings {
			max_attempts: 2,
			base_delay_ms: 10,
			max_delay_ms: 40,
			jitter_ratio: 0.1,
		};
		let policy = RetryPolicy::from(&settings);
		assert_eq!(policy.max_attempts(), 2);
		assert_eq!(policy.next_delay(1), Duration::from_millis(10));
		assert_eq!(policy.next_delay(5), Duration::from_millis(40));
	}

	#[test]
	fn test_no_retry_policy() {
		let policy = RetryPolicy::no_retry();
		assert!(!policy.should_retry(1, &server_error()));
	}
}
