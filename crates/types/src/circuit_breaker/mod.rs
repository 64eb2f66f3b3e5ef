//! Circuit breaker types and core data structures
//!
//! One [`CircuitBreakerState`] exists per registered provider for the whole
//! process lifetime. It owns the provider's [`FailureWindow`], the sliding
//! record of logical call outcomes that drives `Closed -> Open` transitions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Circuit breaker state machine states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CircuitState {
	/// Normal operation - allow all requests
	Closed,
	/// Block requests - provider is failing
	Open,
	/// Testing recovery - exactly one trial call allowed
	HalfOpen,
}

/// Sliding window of the last N logical call outcomes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureWindow {
	capacity: usize,
	/// `true` = success, oldest first
	outcomes: VecDeque<bool>,
}

impl FailureWindow {
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			capacity,
			outcomes: VecDeque::with_capacity(capacity),
		}
	}

	/// Push an outcome, evicting the oldest one once full
	pub fn record(&mut self, success: bool) {
		if self.outcomes.len() == self.capacity {
			self.outcomes.pop_front();
		}
		self.outcomes.push_back(success);
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.outcomes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.outcomes.is_empty()
	}

	pub fn is_full(&self) -> bool {
		self.outcomes.len() == self.capacity
	}

	pub fn failures(&self) -> usize {
		self.outcomes.iter().filter(|ok| !**ok).count()
	}

	/// Failure ratio over recorded outcomes, 0.0 when empty
	pub fn failure_ratio(&self) -> f64 {
		if self.outcomes.is_empty() {
			return 0.0;
		}
		self.failures() as f64 / self.outcomes.len() as f64
	}

	pub fn clear(&mut self) {
		self.outcomes.clear();
	}
}

/// Circuit breaker state for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerState {
	/// Provider this circuit protects
	pub provider: String,
	/// Current state of the circuit
	pub state: CircuitState,
	/// Outcomes of recent logical calls
	pub window: FailureWindow,
	/// When the circuit last opened (None if not currently open)
	pub opened_at: Option<DateTime<Utc>>,
	/// When the next trial call may be made (None unless open)
	pub cooldown_deadline: Option<DateTime<Utc>>,
	/// Human-readable reason why the circuit opened
	pub reason: Option<String>,
	/// Whether the single half-open trial call has been handed out
	pub trial_in_flight: bool,
	/// Number of consecutive failed recovery trials
	pub recovery_attempt_count: u32,
	/// When this circuit breaker state was created
	pub created_at: DateTime<Utc>,
	/// When this state was last updated
	pub last_updated: DateTime<Utc>,
}

impl CircuitBreakerState {
	/// Create a new circuit breaker state in closed position
	pub fn new_closed(provider: impl Into<String>, window_size: usize) -> Self {
		let now = Utc::now();
		Self {
			provider: provider.into(),
			state: CircuitState::Closed,
			window: FailureWindow::new(window_size),
			opened_at: None,
			cooldown_deadline: None,
			reason: None,
			trial_in_flight: false,
			recovery_attempt_count: 0,
			created_at: now,
			last_updated: now,
		}
	}

	/// Move to `Open`, starting the cooldown from `now`
	pub fn open(&mut self, now: DateTime<Utc>, cooldown: Duration, reason: String) {
		self.state = CircuitState::Open;
		self.opened_at = Some(now);
		self.cooldown_deadline = Some(now + cooldown);
		self.reason = Some(reason);
		self.trial_in_flight = false;
		self.last_updated = now;
	}

	/// Move to `HalfOpen` with the trial slot still free
	pub fn half_open(&mut self, now: DateTime<Utc>) {
		self.state = CircuitState::HalfOpen;
		self.trial_in_flight = false;
		self.last_updated = now;
	}

	/// Move to `Closed`, forgetting past failures
	pub fn close(&mut self, now: DateTime<Utc>) {
		self.state = CircuitState::Closed;
		self.window.clear();
		self.opened_at = None;
		self.cooldown_deadline = None;
		self.reason = None;
		self.trial_in_flight = false;
		self.recovery_attempt_count = 0;
		self.last_updated = now;
	}

	/// Check if this circuit should transition to half-open state
	pub fn should_attempt_reset(&self, now: DateTime<Utc>) -> bool {
		match self.state {
			CircuitState::Open => self
				.cooldown_deadline
				.map(|deadline| now >= deadline)
				.unwrap_or(false),
			_ => false,
		}
	}

	/// Whether a call would currently be permitted, without changing state
	pub fn is_eligible_at(&self, now: DateTime<Utc>) -> bool {
		match self.state {
			CircuitState::Closed => true,
			CircuitState::Open => self.should_attempt_reset(now),
			CircuitState::HalfOpen => !self.trial_in_flight,
		}
	}

	/// Update the last_updated timestamp
	pub fn touch(&mut self) {
		self.last_updated = Utc::now();
	}
}
