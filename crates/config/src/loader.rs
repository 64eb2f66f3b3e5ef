//! Configuration loading utilities

use crate::{ConfigValidationError, Settings};
use config::{Config, ConfigError, Environment, File};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Default config file stem, resolved as `.toml`, `.json` or `.yaml`
pub const DEFAULT_CONFIG_FILE: &str = "config/config";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
	#[error("Failed to read configuration: {0}")]
	Source(#[from] ConfigError),
	#[error("Invalid configuration: {0}")]
	Validation(#[from] ConfigValidationError),
}

/// Load configuration from `$CONFIG_PATH` or `config/config.*`
///
/// Values may be overridden with `LLMO__SECTION__KEY` environment variables.
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	match std::env::var(CONFIG_PATH_ENV) {
		Ok(path) => load_config_from(&path, true),
		Err(_) => load_config_from(DEFAULT_CONFIG_FILE, false),
	}
}

/// Load and validate configuration from a specific file
pub fn load_config_from(path: &str, required: bool) -> Result<Settings, ConfigLoadError> {
	debug!("Loading configuration from {} (required: {})", path, required);

	let settings: Settings = Config::builder()
		.add_source(File::with_name(path).required(required))
		.add_source(Environment::with_prefix("LLMO").separator("__"))
		.build()?
		.try_deserialize()?;

	settings.validate()?;
	Ok(settings)
}
