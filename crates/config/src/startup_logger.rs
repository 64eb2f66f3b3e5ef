//! Service startup logging for the LLM orchestrator

use crate::Settings;
use std::env;
use tracing::{info, warn};

/// Logs service information at startup
pub fn log_service_info() {
	let service_name = "llmo-orchestrator";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== LLM Orchestrator Starting ===");
	info!("🚀 Service: {} v{}", service_name, service_version);
	info!("💻 Platform: {} ({})", env::consts::OS, env::consts::ARCH);

	if let Ok(cwd) = env::current_dir() {
		info!("📁 Working Directory: {}", cwd.display());
	}

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	}

	if let Ok(config_path) = env::var(crate::loader::CONFIG_PATH_ENV) {
		info!("📋 Config Path: {}", config_path);
	}

	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs the provider table and resilience settings that will be used
pub fn log_orchestration_settings(settings: &Settings) {
	info!(
		"🎯 Default strategy: {} (request timeout {}ms)",
		settings.orchestration.default_strategy, settings.orchestration.request_timeout_ms
	);
	info!(
		"🔁 Retry: {} attempts, base {}ms, cap {}ms, jitter {:.2}",
		settings.retry.max_attempts,
		settings.retry.base_delay_ms,
		settings.retry.max_delay_ms,
		settings.retry.jitter_ratio
	);
	let cb = &settings.circuit_breaker;
	if cb.enabled {
		info!(
			"⚡ Circuit breaker: threshold {:.0}% over {} calls, cooldown {}ms (max {}ms)",
			cb.failure_threshold * 100.0,
			cb.window_size,
			cb.cooldown_ms,
			cb.effective_max_cooldown_ms()
		);
	} else {
		warn!("⚡ Circuit breaker disabled");
	}

	let mut providers: Vec<_> = settings.providers.iter().collect();
	providers.sort_by(|(a_id, a), (b_id, b)| (a.priority, *a_id).cmp(&(b.priority, *b_id)));
	for (id, provider) in providers {
		info!(
			"🤖 Provider '{}': priority {}, timeout {}ms, enabled {}, endpoint {}",
			id, provider.priority, provider.timeout_ms, provider.enabled, provider.endpoint
		);
		if let Some(api_key) = provider.api_key.as_ref().filter(|k| k.is_inline_secret()) {
			warn!(
				"🔑 Provider '{}' uses an {} for its API key; prefer an environment variable",
				id,
				api_key.description()
			);
		}
	}
	if settings.enabled_providers().is_empty() {
		warn!("No providers enabled; every request will fail with NoProvidersAvailable");
	}
}

/// Logs service shutdown information
pub fn log_service_shutdown() {
	info!("🛑 LLM Orchestrator Shutting Down");
	info!(
		"🕒 Shutdown at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs additional startup completion information
pub fn log_startup_complete(bind_address: &str) {
	info!("✅ LLM Orchestrator Started Successfully");
	info!("🌐 Server listening on: {}", bind_address);
	info!("📡 Ready to accept requests");
}
