//! LLM Orchestrator Configuration
//!
//! Settings, loading and startup utilities for the LLM orchestration service.

pub mod configurable_value;
pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use configurable_value::{ConfigurableValue, ConfigurableValueError, ValueType};
pub use loader::{load_config, load_config_from, ConfigLoadError};
pub use settings::{
	CircuitBreakerSettings, ConfigValidationError, LogFormat, LoggingSettings, MetricsBackend,
	MetricsSettings, OrchestrationSettings, ProviderKind, ProviderSettings, QualitySettings,
	RetrySettings, ServerSettings, Settings,
};
pub use startup_logger::{
	log_orchestration_settings, log_service_info, log_service_shutdown, log_startup_complete,
};
