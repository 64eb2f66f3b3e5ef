//! Configuration settings structures

use crate::{configurable_value::ConfigurableValue, ConfigurableValueError};
use llmo_types::constants::limits::*;
use llmo_types::{Capability, ProviderIdentity, SecretString, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
	pub server: ServerSettings,
	pub logging: LoggingSettings,
	pub orchestration: OrchestrationSettings,
	pub retry: RetrySettings,
	pub circuit_breaker: CircuitBreakerSettings,
	pub quality: QualitySettings,
	pub metrics: MetricsSettings,
	pub providers: HashMap<String, ProviderSettings>,
}

/// Server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
	pub host: String,
	pub port: u16,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			host: "0.0.0.0".to_string(),
			port: 3000,
		}
	}
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
			structured: false,
		}
	}
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

/// Request-level orchestration defaults
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OrchestrationSettings {
	/// Strategy used when a request does not name one
	pub default_strategy: Strategy,
	/// Overall deadline for one request in milliseconds
	pub request_timeout_ms: u64,
}

impl Default for OrchestrationSettings {
	fn default() -> Self {
		Self {
			default_strategy: Strategy::Failover,
			request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
		}
	}
}

impl OrchestrationSettings {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}
}

/// Retry policy for provider calls
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RetrySettings {
	/// Total attempts per logical call, first attempt included
	pub max_attempts: u32,
	pub base_delay_ms: u64,
	pub max_delay_ms: u64,
	/// Random spread applied to each delay, at most 0.2 (±20%)
	pub jitter_ratio: f64,
}

impl Default for RetrySettings {
	fn default() -> Self {
		Self {
			max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
			base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
			max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
			jitter_ratio: 0.0,
		}
	}
}

/// Circuit breaker configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CircuitBreakerSettings {
	pub enabled: bool,
	/// Failure ratio above which a full window opens the circuit
	pub failure_threshold: f64,
	/// Number of recent logical calls considered
	pub window_size: usize,
	pub cooldown_ms: u64,
	/// Upper bound for cooldown growth after failed recovery trials;
	/// defaults to `cooldown_ms`, i.e. no growth
	pub max_cooldown_ms: Option<u64>,
}

impl Default for CircuitBreakerSettings {
	fn default() -> Self {
		Self {
			enabled: true,
			failure_threshold: DEFAULT_FAILURE_THRESHOLD,
			window_size: DEFAULT_FAILURE_WINDOW_SIZE,
			cooldown_ms: DEFAULT_CIRCUIT_COOLDOWN_MS,
			max_cooldown_ms: None,
		}
	}
}

impl CircuitBreakerSettings {
	pub fn effective_max_cooldown_ms(&self) -> u64 {
		self.max_cooldown_ms
			.unwrap_or(self.cooldown_ms)
			.max(self.cooldown_ms)
	}
}

/// Quality scoring configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct QualitySettings {
	/// Weight in [0, 1] of the provider's recent success rate in the final score
	pub history_weight: f64,
}

/// Metrics store backend
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricsBackend {
	#[default]
	Memory,
	Jsonl,
}

/// Metrics store configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsSettings {
	pub backend: MetricsBackend,
	/// File path for the jsonl backend
	pub path: Option<String>,
	pub max_points_per_provider: usize,
	/// Window used by the health snapshot and history weighting
	pub health_window_minutes: u64,
}

impl Default for MetricsSettings {
	fn default() -> Self {
		Self {
			backend: MetricsBackend::Memory,
			path: None,
			max_points_per_provider: DEFAULT_MAX_POINTS_PER_PROVIDER,
			health_window_minutes: DEFAULT_HEALTH_WINDOW_MINUTES,
		}
	}
}

/// Provider transport kind
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
	/// Generic JSON-over-HTTP provider
	#[default]
	Http,
}

/// Individual provider configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderSettings {
	/// Display name; the table key is used when absent
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub kind: ProviderKind,
	pub endpoint: String,
	#[serde(default)]
	pub model: Option<String>,
	#[serde(default)]
	pub api_key: Option<ConfigurableValue>,
	/// Lower is preferred
	#[serde(default)]
	pub priority: u32,
	#[serde(default = "default_provider_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_true")]
	pub enabled: bool,
	#[serde(default)]
	pub headers: Option<HashMap<String, String>>,
	/// Defaults to every capability
	#[serde(default)]
	pub capabilities: Option<Vec<Capability>>,
	#[serde(default)]
	pub cost_per_1k_tokens: Option<f64>,
}

fn default_provider_timeout_ms() -> u64 {
	DEFAULT_PROVIDER_TIMEOUT_MS
}

fn default_true() -> bool {
	true
}

impl ProviderSettings {
	pub fn new(endpoint: impl Into<String>, priority: u32) -> Self {
		Self {
			name: None,
			kind: ProviderKind::Http,
			endpoint: endpoint.into(),
			model: None,
			api_key: None,
			priority,
			timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
			enabled: true,
			headers: None,
			capabilities: None,
			cost_per_1k_tokens: None,
		}
	}

	/// Build the registry identity for the provider registered under `id`
	pub fn identity(&self, id: &str) -> ProviderIdentity {
		let identity = ProviderIdentity::new(id, self.priority);
		if self.enabled {
			identity
		} else {
			identity.disabled()
		}
	}

	pub fn capabilities(&self) -> Vec<Capability> {
		self.capabilities
			.clone()
			.unwrap_or_else(|| Capability::ALL.to_vec())
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	/// Resolve the API key, if one is configured
	pub fn resolve_api_key(&self) -> Result<Option<SecretString>, ConfigurableValueError> {
		self.api_key
			.as_ref()
			.map(ConfigurableValue::resolve_for_secret)
			.transpose()
	}
}

/// Errors found while validating loaded settings
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
	#[error("circuit_breaker.window_size must be at least {min}, got {actual}")]
	WindowTooSmall { min: usize, actual: usize },
	#[error("circuit_breaker.failure_threshold must be in (0, 1], got {0}")]
	InvalidFailureThreshold(f64),
	#[error("circuit_breaker.cooldown_ms must be greater than zero")]
	ZeroCooldown,
	#[error("{field} must not exceed {max}ms, got {actual}ms")]
	CooldownTooLong {
		field: &'static str,
		max: u64,
		actual: u64,
	},
	#[error("retry.max_attempts must be between 1 and {max}, got {actual}")]
	InvalidRetryAttempts { max: u32, actual: u32 },
	#[error("retry.jitter_ratio must be in [0, {max}], got {actual}")]
	InvalidJitter { max: f64, actual: f64 },
	#[error("retry.max_delay_ms ({max_delay_ms}) must not be below base_delay_ms ({base_delay_ms})")]
	InvalidRetryDelays { base_delay_ms: u64, max_delay_ms: u64 },
	#[error("{field} must be between {min}ms and {max}ms, got {actual}ms")]
	TimeoutOutOfRange {
		field: String,
		min: u64,
		max: u64,
		actual: u64,
	},
	#[error("quality.history_weight must be in [0, 1], got {0}")]
	InvalidHistoryWeight(f64),
	#[error("metrics.path is required for the jsonl backend")]
	MissingMetricsPath,
	#[error("provider '{provider}' has an invalid endpoint: {reason}")]
	InvalidEndpoint { provider: String, reason: String },
	#[error("provider '{provider}' declares no capabilities")]
	NoCapabilities { provider: String },
	#[error("provider '{provider}' has a negative cost_per_1k_tokens")]
	NegativeCost { provider: String },
}

impl Settings {
	/// Get server bind address
	pub fn bind_address(&self) -> String {
		format!("{}:{}", self.server.host, self.server.port)
	}

	/// Enabled providers only
	pub fn enabled_providers(&self) -> HashMap<String, ProviderSettings> {
		self.providers
			.iter()
			.filter(|(_, config)| config.enabled)
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}

	/// Check every section for values the orchestrator cannot run with
	///
	/// Zero enabled providers is allowed; requests then fail with
	/// `NoProvidersAvailable`. Duplicate priorities are allowed and are
	/// broken by provider id.
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		let cb = &self.circuit_breaker;
		if cb.window_size < MIN_FAILURE_WINDOW_SIZE {
			return Err(ConfigValidationError::WindowTooSmall {
				min: MIN_FAILURE_WINDOW_SIZE,
				actual: cb.window_size,
			});
		}
		if !(cb.failure_threshold > 0.0 && cb.failure_threshold <= 1.0) {
			return Err(ConfigValidationError::InvalidFailureThreshold(
				cb.failure_threshold,
			));
		}
		if cb.cooldown_ms == 0 {
			return Err(ConfigValidationError::ZeroCooldown);
		}
		check_cooldown("circuit_breaker.cooldown_ms", cb.cooldown_ms)?;
		if let Some(max_cooldown_ms) = cb.max_cooldown_ms {
			check_cooldown("circuit_breaker.max_cooldown_ms", max_cooldown_ms)?;
		}

		let retry = &self.retry;
		if retry.max_attempts == 0 || retry.max_attempts > MAX_RETRY_ATTEMPTS {
			return Err(ConfigValidationError::InvalidRetryAttempts {
				max: MAX_RETRY_ATTEMPTS,
				actual: retry.max_attempts,
			});
		}
		if !(0.0..=MAX_RETRY_JITTER_RATIO).contains(&retry.jitter_ratio) {
			return Err(ConfigValidationError::InvalidJitter {
				max: MAX_RETRY_JITTER_RATIO,
				actual: retry.jitter_ratio,
			});
		}
		if retry.max_delay_ms < retry.base_delay_ms {
			return Err(ConfigValidationError::InvalidRetryDelays {
				base_delay_ms: retry.base_delay_ms,
				max_delay_ms: retry.max_delay_ms,
			});
		}

		check_timeout(
			"orchestration.request_timeout_ms",
			self.orchestration.request_timeout_ms,
		)?;

		if !(0.0..=1.0).contains(&self.quality.history_weight) {
			return Err(ConfigValidationError::InvalidHistoryWeight(
				self.quality.history_weight,
			));
		}

		if self.metrics.backend == MetricsBackend::Jsonl && self.metrics.path.is_none() {
			return Err(ConfigValidationError::MissingMetricsPath);
		}

		for (id, provider) in &self.providers {
			check_timeout(&format!("providers.{}.timeout_ms", id), provider.timeout_ms)?;

			let endpoint = url::Url::parse(&provider.endpoint).map_err(|e| {
				ConfigValidationError::InvalidEndpoint {
					provider: id.clone(),
					reason: e.to_string(),
				}
			})?;
			if !matches!(endpoint.scheme(), "http" | "https") {
				return Err(ConfigValidationError::InvalidEndpoint {
					provider: id.clone(),
					reason: format!("unsupported scheme '{}'", endpoint.scheme()),
				});
			}

			let declared: HashSet<Capability> = provider.capabilities().into_iter().collect();
			if declared.is_empty() {
				return Err(ConfigValidationError::NoCapabilities {
					provider: id.clone(),
				});
			}

			if provider.cost_per_1k_tokens.is_some_and(|cost| cost < 0.0) {
				return Err(ConfigValidationError::NegativeCost {
					provider: id.clone(),
				});
			}
		}

		Ok(())
	}
}

fn check_timeout(field: &str, actual: u64) -> Result<(), ConfigValidationError> {
	if (MIN_PROVIDER_TIMEOUT_MS..=MAX_PROVIDER_TIMEOUT_MS).contains(&actual) {
		Ok(())
	} else {
		Err(ConfigValidationError::TimeoutOutOfRange {
			field: field.to_string(),
			min: MIN_PROVIDER_TIMEOUT_MS,
			max: MAX_PROVIDER_TIMEOUT_MS,
			actual,
		})
	}
}

fn check_cooldown(field: &'static str, actual: u64) -> Result<(), ConfigValidationError> {
	if actual > MAX_CIRCUIT_COOLDOWN_MS {
		return Err(ConfigValidationError::CooldownTooLong {
			field,
			max: MAX_CIRCUIT_COOLDOWN_MS,
			actual,
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn settings_with_provider() -> Settings {
		let mut settings = Settings::default();
		settings.providers.insert(
			"primary".to_string(),
			ProviderSettings::new("https://llm.example.com/v1/extract", 1),
		);
		settings
	}

	#[test]
	fn test_defaults_are_valid() {
		let settings = Settings::default();
		assert!(settings.validate().is_ok());
		assert_eq!(settings.retry.max_attempts, 3);
		assert_eq!(settings.circuit_breaker.window_size, 10);
		assert_eq!(settings.circuit_breaker.cooldown_ms, 60_000);
		assert_eq!(settings.circuit_breaker.effective_max_cooldown_ms(), 60_000);
		assert_eq!(settings.orchestration.default_strategy, Strategy::Failover);
		assert_eq!(settings.bind_address(), "0.0.0.0:3000");
	}

	#[test]
	fn test_window_below_minimum_rejected() {
		let mut settings = Settings::default();
		settings.circuit_breaker.window_size = 4;
		assert_eq!(
			settings.validate(),
			Err(ConfigValidationError::WindowTooSmall { min: 5, actual: 4 })
		);
	}

	#[test]
	fn test_threshold_bounds() {
		let mut settings = Settings::default();
		settings.circuit_breaker.failure_threshold = 0.0;
		assert!(settings.validate().is_err());
		settings.circuit_breaker.failure_threshold = 1.0;
		assert!(settings.validate().is_ok());
		settings.circuit_breaker.failure_threshold = 1.5;
		assert!(settings.validate().is_err());
	}

	#[test]
	fn test_retry_bounds() {
		let mut settings = Settings::default();
		settings.retry.max_attempts = 0;
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::InvalidRetryAttempts { .. })
		));

		settings.retry.max_attempts = 3;
		settings.retry.jitter_ratio = 0.25;
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::InvalidJitter { .. })
		));

		settings.retry.jitter_ratio = 0.2;
		settings.retry.max_delay_ms = 10;
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::InvalidRetryDelays { .. })
		));
	}

	#[test]
	fn test_provider_timeout_range() {
		let mut settings = settings_with_provider();
		if let Some(provider) = settings.providers.get_mut("primary") {
			provider.timeout_ms = 50;
		}
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::TimeoutOutOfRange { .. })
		));
	}

	#[test]
	fn test_provider_endpoint_must_be_http() {
		let mut settings = settings_with_provider();
		settings.providers.insert(
			"ftp".to_string(),
			ProviderSettings::new("ftp://files.example.com", 2),
		);
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::InvalidEndpoint { .. })
		));
	}

	#[test]
	fn test_jsonl_backend_needs_path() {
		let mut settings = Settings::default();
		settings.metrics.backend = MetricsBackend::Jsonl;
		assert_eq!(
			settings.validate(),
			Err(ConfigValidationError::MissingMetricsPath)
		);
		settings.metrics.path = Some("metrics.jsonl".to_string());
		assert!(settings.validate().is_ok());
	}

	#[test]
	fn test_provider_identity_and_capabilities() {
		let mut provider = ProviderSettings::new("https://llm.example.com", 3);
		assert_eq!(provider.capabilities(), Capability::ALL.to_vec());
		assert!(provider.identity("p").enabled);

		provider.enabled = false;
		provider.capabilities = Some(vec![Capability::Summarize]);
		let identity = provider.identity("p");
		assert!(!identity.enabled);
		assert_eq!(identity.priority, 3);
		assert_eq!(provider.capabilities(), vec![Capability::Summarize]);
	}

	#[test]
	fn test_enabled_providers_filter() {
		let mut settings = settings_with_provider();
		let mut off = ProviderSettings::new("https://other.example.com", 2);
		off.enabled = false;
		settings.providers.insert("off".to_string(), off);

		let enabled = settings.enabled_providers();
		assert_eq!(enabled.len(), 1);
		assert!(enabled.contains_key("primary"));
	}

	#[test]
	fn test_unbounded_cooldowns_are_rejected() {
		let mut settings = settings_with_provider();
		settings.circuit_breaker.cooldown_ms = u64::MAX;
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::CooldownTooLong {
				field: "circuit_breaker.cooldown_ms",
				..
			})
		));

		let mut settings = settings_with_provider();
		settings.circuit_breaker.max_cooldown_ms = Some(MAX_CIRCUIT_COOLDOWN_MS + 1);
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::CooldownTooLong {
				field: "circuit_breaker.max_cooldown_ms",
				..
			})
		));

		settings.circuit_breaker.max_cooldown_ms = Some(MAX_CIRCUIT_COOLDOWN_MS);
		assert!(settings.validate().is_ok());
	}

	#[test]
	fn test_max_cooldown_never_below_base() {
		let settings = CircuitBreakerSettings {
			max_cooldown_ms: Some(10),
			..Default::default()
		};
		assert_eq!(settings.effective_max_cooldown_ms(), 60_000);
	}

	#[test]
	fn test_resolve_plain_api_key() {
		let mut provider = ProviderSettings::new("https://llm.example.com", 1);
		assert!(provider.resolve_api_key().unwrap().is_none());

		provider.api_key = Some(ConfigurableValue::from_plain("sk-test"));
		let key = provider.resolve_api_key().unwrap().unwrap();
		assert_eq!(key.expose_secret(), "sk-test");
	}
}
