//! Circuit breaker service
//!
//! Tracks one [`CircuitBreakerState`] per provider and decides whether the
//! provider may be called. Outcomes are recorded once per logical call
//! (after retries), never per attempt.
//!
//! ```text
//! Closed --(window full, failure ratio > threshold)--> Open
//! Open --(cooldown elapsed, next acquire)--> HalfOpen (one trial)
//! HalfOpen --(trial succeeds)--> Closed
//! HalfOpen --(trial fails)--> Open (cooldown grows)
//! ```

use chrono::{Duration, Utc};
use dashmap::DashMap;
use llmo_config::CircuitBreakerSettings;
use llmo_types::{CircuitBreakerState, CircuitState};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runtime configuration of the breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
	pub enabled: bool,
	/// Failure ratio that must be strictly exceeded to open
	pub failure_threshold: f64,
	pub window_size: usize,
	pub cooldown: Duration,
	/// Cooldown never grows beyond this
	pub max_cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
	fn default() -> Self {
		Self::from(&CircuitBreakerSettings::default())
	}
}

impl From<&CircuitBreakerSettings> for CircuitBreakerConfig {
	fn from(settings: &CircuitBreakerSettings) -> Self {
		Self {
			enabled: settings.enabled,
			failure_threshold: settings.failure_threshold,
			window_size: settings.window_size,
			cooldown: Duration::milliseconds(settings.cooldown_ms as i64),
			max_cooldown: Duration::milliseconds(settings.effective_max_cooldown_ms() as i64),
		}
	}
}

type StateMap = Arc<DashMap<String, CircuitBreakerState>>;

/// Permission to make one logical call against a provider
///
/// Handed out by [`CircuitBreakerTrait::try_acquire`] and consumed by
/// [`CircuitBreakerTrait::record_outcome`], so an outcome is recorded at most
/// once per acquired call. A half-open trial permit that is dropped without
/// an outcome (cancelled request) frees the trial slot again.
#[derive(Debug)]
pub struct CallPermit {
	provider: String,
	trial: bool,
	states: Option<StateMap>,
	settled: bool,
}

impl CallPermit {
	/// Permit that is not tied to any breaker state
	pub fn unguarded(provider: impl Into<String>) -> Self {
		Self {
			provider: provider.into(),
			trial: false,
			states: None,
			settled: false,
		}
	}

	fn guarded(provider: &str, trial: bool, states: StateMap) -> Self {
		Self {
			provider: provider.to_string(),
			trial,
			states: Some(states),
			settled: false,
		}
	}

	pub fn provider(&self) -> &str {
		&self.provider
	}

	/// Whether this permit is the single half-open recovery trial
	pub fn is_trial(&self) -> bool {
		self.trial
	}

	fn settle(mut self) -> (String, bool) {
		self.settled = true;
		(std::mem::take(&mut self.provider), self.trial)
	}
}

impl Drop for CallPermit {
	fn drop(&mut self) {
		if self.settled || !self.trial {
			return;
		}
		if let Some(states) = &self.states {
			if let Some(mut state) = states.get_mut(&self.provider) {
				if state.state == CircuitState::HalfOpen && state.trial_in_flight {
					state.trial_in_flight = false;
					state.touch();
					debug!(
						"Released unfinished half-open trial for provider '{}'",
						self.provider
					);
				}
			}
		}
	}
}

/// Circuit breaker operations used by the orchestrator
#[cfg_attr(test, mockall::automock)]
pub trait CircuitBreakerTrait: Send + Sync {
	/// Whether breaking is active at all; a disabled breaker admits everything
	fn is_enabled(&self) -> bool;

	/// Ensure a closed state exists for the provider
	fn register(&self, provider: &str);

	/// Whether a call would currently be admitted; never changes state
	fn is_eligible(&self, provider: &str) -> bool;

	/// Claim permission for one logical call
	///
	/// Performs the lazy `Open -> HalfOpen` transition once the cooldown has
	/// elapsed and hands out the single trial slot.
	fn try_acquire(&self, provider: &str) -> Option<CallPermit>;

	/// Record the final outcome of a permitted logical call
	fn record_outcome(&self, permit: CallPermit, success: bool);

	/// Snapshot of the provider's state
	fn state(&self, provider: &str) -> Option<CircuitBreakerState>;

	/// Open the circuit immediately
	fn force_open(&self, provider: &str, reason: &str);

	/// Close the circuit and forget recorded failures
	fn reset(&self, provider: &str);
}

/// DashMap-backed circuit breaker; each provider entry is locked independently
#[derive(Debug, Clone)]
pub struct CircuitBreakerService {
	states: StateMap,
	config: CircuitBreakerConfig,
}

impl CircuitBreakerService {
	pub fn new(config: CircuitBreakerConfig) -> Self {
		Self {
			states: Arc::new(DashMap::new()),
			config,
		}
	}

	pub fn from_settings(settings: &CircuitBreakerSettings) -> Self {
		Self::new(CircuitBreakerConfig::from(settings))
	}

	pub fn config(&self) -> &CircuitBreakerConfig {
		&self.config
	}

	/// Cooldown after `recovery_attempts` failed trials: base * 2^n, capped
	pub fn calculate_cooldown(&self, recovery_attempts: u32) -> Duration {
		let cap = self.config.max_cooldown.max(self.config.cooldown);
		let multiplier = 2_i32.pow(recovery_attempts.min(10));
		self.config
			.cooldown
			.checked_mul(multiplier)
			.map_or(cap, |grown| grown.min(cap))
	}

	/// States of every known provider, sorted by provider name
	pub fn snapshot(&self) -> Vec<CircuitBreakerState> {
		let mut states: Vec<_> = self
			.states
			.iter()
			.map(|entry| entry.value().clone())
			.collect();
		states.sort_by(|a, b| a.provider.cmp(&b.provider));
		states
	}

	fn new_state(&self, provider: &str) -> CircuitBreakerState {
		CircuitBreakerState::new_closed(provider, self.config.window_size)
	}

	fn record_closed(&self, state: &mut CircuitBreakerState, success: bool) {
		state.window.record(success);
		state.touch();

		if state.window.is_full() && state.window.failure_ratio() > self.config.failure_threshold {
			let cooldown = self.calculate_cooldown(state.recovery_attempt_count);
			let reason = format!(
				"{} of last {} calls failed",
				state.window.failures(),
				state.window.len()
			);
			state.open(Utc::now(), cooldown, reason.clone());
			info!(
				"Circuit breaker opened for provider '{}': {} (cooldown: {}ms)",
				state.provider,
				reason,
				cooldown.num_milliseconds()
			);
		}
	}

	fn record_trial(&self, state: &mut CircuitBreakerState, success: bool) {
		if success {
			state.close(Utc::now());
			info!(
				"Circuit breaker closed for provider '{}': recovery trial succeeded",
				state.provider
			);
			return;
		}

		state.recovery_attempt_count += 1;
		let cooldown = self.calculate_cooldown(state.recovery_attempt_count);
		let reason = format!(
			"recovery trial {} failed",
			state.recovery_attempt_count
		);
		state.open(Utc::now(), cooldown, reason);
		warn!(
			"Circuit breaker reopened for provider '{}' after failed trial (attempt {}, cooldown: {}ms)",
			state.provider,
			state.recovery_attempt_count,
			cooldown.num_milliseconds()
		);
	}
}

impl CircuitBreakerTrait for CircuitBreakerService {
	fn is_enabled(&self) -> bool {
		self.config.enabled
	}

	fn register(&self, provider: &str) {
		self.states
			.entry(provider.to_string())
			.or_insert_with(|| self.new_state(provider));
	}

	fn is_eligible(&self, provider: &str) -> bool {
		if !self.config.enabled {
			return true;
		}
		self.states
			.get(provider)
			.map(|state| state.is_eligible_at(Utc::now()))
			.unwrap_or(true)
	}

	fn try_acquire(&self, provider: &str) -> Option<CallPermit> {
		if !self.config.enabled {
			return Some(CallPermit::unguarded(provider));
		}

		let mut state = self
			.states
			.entry(provider.to_string())
			.or_insert_with(|| self.new_state(provider));
		let now = Utc::now();

		if state.should_attempt_reset(now) {
			state.half_open(now);
			info!(
				"Circuit breaker half-open for provider '{}': cooldown elapsed",
				provider
			);
		}

		match state.state {
			CircuitState::Closed => Some(CallPermit::guarded(
				provider,
				false,
				Arc::clone(&self.states),
			)),
			CircuitState::HalfOpen if !state.trial_in_flight => {
				state.trial_in_flight = true;
				state.last_updated = now;
				debug!("Granted half-open trial for provider '{}'", provider);
				Some(CallPermit::guarded(
					provider,
					true,
					Arc::clone(&self.states),
				))
			},
			CircuitState::HalfOpen | CircuitState::Open => {
				debug!(
					"Circuit breaker rejected call to provider '{}' ({:?})",
					provider, state.state
				);
				None
			},
		}
	}

	fn record_outcome(&self, permit: CallPermit, success: bool) {
		let guarded = permit.states.is_some();
		let (provider, trial) = permit.settle();
		if !self.config.enabled || !guarded {
			return;
		}

		let Some(mut state) = self.states.get_mut(&provider) else {
			warn!(
				"Outcome recorded for unknown provider '{}', ignoring",
				provider
			);
			return;
		};

		match (state.state, trial) {
			(CircuitState::Closed, false) => self.record_closed(&mut state, success),
			(CircuitState::HalfOpen, true) => self.record_trial(&mut state, success),
			(current, _) => {
				// Late outcome of a call admitted before the last transition
				debug!(
					"Ignoring stale outcome for provider '{}' in state {:?}",
					provider, current
				);
			},
		}
	}

	fn state(&self, provider: &str) -> Option<CircuitBreakerState> {
		self.states.get(provider).map(|state| state.clone())
	}

	fn force_open(&self, provider: &str, reason: &str) {
		let cooldown = self.config.cooldown;
		let mut state = self
			.states
			.entry(provider.to_string())
			.or_insert_with(|| self.new_state(provider));
		state.open(Utc::now(), cooldown, reason.to_string());
		warn!(
			"Circuit breaker forced open for provider '{}': {}",
			provider, reason
		);
	}

	fn reset(&self, provider: &str) {
		if let Some(mut state) = self.states.get_mut(provider) {
			state.close(Utc::now());
			info!("Circuit breaker reset for provider '{}'", provider);
		}
	}
}
