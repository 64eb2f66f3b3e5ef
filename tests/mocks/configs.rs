//! Settings tuned for fast, deterministic tests

use llmo_orchestrator::config::MetricsBackend;
use llmo_orchestrator::{Settings, Strategy};

pub struct TestConfigs;

#[allow(dead_code)]
impl TestConfigs {
	/// Short retry delays and the smallest allowed breaker window
	pub fn fast() -> Settings {
		let mut settings = Settings::default();
		settings.orchestration.request_timeout_ms = 5_000;
		settings.retry.max_attempts = 3;
		settings.retry.base_delay_ms = 5;
		settings.retry.max_delay_ms = 20;
		settings.retry.jitter_ratio = 0.0;
		settings.circuit_breaker.window_size = 5;
		settings.circuit_breaker.failure_threshold = 0.5;
		settings.circuit_breaker.cooldown_ms = 60_000;
		settings
	}

	/// Single attempt per call so every request lands one breaker outcome
	pub fn no_retry() -> Settings {
		let mut settings = Self::fast();
		settings.retry.max_attempts = 1;
		settings
	}

	/// Breaker with a cooldown short enough to observe half-open recovery
	pub fn short_cooldown(cooldown_ms: u64) -> Settings {
		let mut settings = Self::no_retry();
		settings.circuit_breaker.cooldown_ms = cooldown_ms;
		settings
	}

	pub fn with_strategy(strategy: Strategy) -> Settings {
		let mut settings = Self::fast();
		settings.orchestration.default_strategy = strategy;
		settings
	}

	pub fn jsonl(path: &str) -> Settings {
		let mut settings = Self::fast();
		settings.metrics.backend = MetricsBackend::Jsonl;
		settings.metrics.path = Some(path.to_string());
		settings
	}
}
