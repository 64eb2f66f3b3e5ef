//! LLM Orchestrator Library
//!
//! Multi-provider LLM orchestration: fans requests out to interchangeable
//! providers, retries transient failures, trips per-provider circuit breakers
//! and reduces results by quality score or field-level consensus.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use llmo_config::{
	load_config, log_orchestration_settings, log_service_info, log_service_shutdown,
	log_startup_complete, LogFormat, MetricsBackend,
};
use llmo_service::{CircuitBreakerService, OrchestratorConfig};
use llmo_storage::{JsonlMetricsStore, MemoryMetricsStore};
use tracing::{info, warn};

// Core domain types
pub use llmo_types::{
	chrono,
	serde_json,
	Capability,
	CircuitState,
	ClassificationContext,
	FieldResolution,
	FieldType,
	MetricsStore,
	OrchestrationError,
	OrchestrationRequest,
	OrchestrationResult,
	PermanentError,
	ProviderAdapter,
	ProviderCallResult,
	ProviderError,
	ProviderHealth,
	ProviderIdentity,
	ProviderInput,
	ProviderPayload,
	ProviderResponse,
	ProviderResult,
	ResultSchema,
	Strategy,
	TokenUsage,
	TransientError,
};

// Service layer
pub use llmo_service::{
	CircuitBreakerTrait, Orchestrator, OrchestratorTrait, ProviderTable, QualityScorer,
	RetryPolicy,
};

// API layer
pub use llmo_api::{create_router, AppState};

// Adapters
pub use llmo_adapters::{HttpProviderAdapter, ProviderFactory, ProviderRegistry};

// Config
pub use llmo_config::{load_config_from, Settings};

pub mod models {
	pub use llmo_types::*;
}

pub mod storage {
	pub use llmo_storage::*;
}

pub mod config {
	pub use llmo_config::*;
}

pub mod service {
	pub use llmo_service::*;
}

pub mod mocks;

pub use async_trait;

/// Provider registered in code rather than through configuration
struct CustomProvider {
	identity: ProviderIdentity,
	adapter: Arc<dyn ProviderAdapter>,
	timeout: Duration,
}

/// Builder wiring settings, providers and the metrics store into an orchestrator
#[derive(Default)]
pub struct OrchestratorBuilder {
	settings: Option<Settings>,
	providers: Vec<CustomProvider>,
	metrics: Option<Arc<dyn MetricsStore>>,
}

impl OrchestratorBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set custom settings
	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Get the current settings
	pub fn settings(&self) -> Option<&Settings> {
		self.settings.as_ref()
	}

	/// Register an adapter next to the configured ones
	///
	/// A provider with the same name as a configured one replaces it.
	pub fn with_provider(
		mut self,
		identity: ProviderIdentity,
		adapter: Arc<dyn ProviderAdapter>,
		timeout: Duration,
	) -> Self {
		self.providers.push(CustomProvider {
			identity,
			adapter,
			timeout,
		});
		self
	}

	/// Use this store instead of the configured metrics backend
	pub fn with_metrics_store(mut self, metrics: Arc<dyn MetricsStore>) -> Self {
		self.metrics = Some(metrics);
		self
	}

	async fn open_metrics_store(
		settings: &Settings,
	) -> Result<Arc<dyn MetricsStore>, Box<dyn std::error::Error>> {
		let metrics = &settings.metrics;
		let store: Arc<dyn MetricsStore> = match metrics.backend {
			MetricsBackend::Memory => Arc::new(MemoryMetricsStore::with_max_points(
				metrics.max_points_per_provider,
			)),
			MetricsBackend::Jsonl => {
				let path = metrics
					.path
					.as_deref()
					.ok_or("metrics.path is required for the jsonl backend")?;
				Arc::new(JsonlMetricsStore::open(path, metrics.max_points_per_provider).await?)
			},
		};
		Ok(store)
	}

	/// Build the orchestrator without starting a server
	pub async fn build(self) -> Result<Orchestrator, Box<dyn std::error::Error>> {
		let settings = self.settings.unwrap_or_default();
		settings.validate()?;

		let registry = ProviderRegistry::from_settings(&settings)
			.map_err(|e| format!("Failed to create provider adapters: {}", e))?;
		let mut table = ProviderTable::from_registry(&registry, &settings);
		for provider in self.providers {
			table.register(provider.identity, provider.adapter, provider.timeout);
		}
		if table.is_empty() {
			warn!("Orchestrator built without providers");
		}
		info!("Successfully initialized with {} provider(s)", table.len());

		let metrics = match self.metrics {
			Some(metrics) => metrics,
			None => Self::open_metrics_store(&settings).await?,
		};

		let breaker = Arc::new(CircuitBreakerService::from_settings(
			&settings.circuit_breaker,
		));

		Ok(Orchestrator::new(Arc::new(table), breaker, metrics)
			.with_retry_policy(RetryPolicy::from(&settings.retry))
			.with_scorer(QualityScorer::new(settings.quality.history_weight))
			.with_config(OrchestratorConfig::from(&settings)))
	}

	/// Build the orchestrator and return the router with state
	pub async fn start(self) -> Result<(axum::Router, AppState), Box<dyn std::error::Error>> {
		let orchestrator = self.build().await?;
		let app_state = AppState::new(Arc::new(orchestrator));
		let router = create_router().with_state(app_state.clone());
		Ok((router, app_state))
	}

	/// Initialize tracing with configuration-based settings
	fn init_tracing_from_settings(settings: &Settings) {
		// RUST_LOG wins over the configured level
		let log_level = &settings.logging.level;
		let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

		let result = match settings.logging.format {
			LogFormat::Json => {
				let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);
				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).try_init()
				} else {
					subscriber.try_init()
				}
			},
			LogFormat::Pretty => {
				let subscriber = tracing_subscriber::fmt()
					.pretty()
					.with_env_filter(env_filter);
				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).try_init()
				} else {
					subscriber.try_init()
				}
			},
			LogFormat::Compact => {
				let subscriber = tracing_subscriber::fmt()
					.compact()
					.with_env_filter(env_filter);
				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).try_init()
				} else {
					subscriber.try_init()
				}
			},
		};

		if result.is_err() {
			// Another subscriber (tests, embedding app) is already installed
			return;
		}

		info!(
			"Logging configuration applied: level={}, format={:?}, structured={}",
			settings.logging.level, settings.logging.format, settings.logging.structured
		);
	}

	/// Start the complete server
	///
	/// Loads `.env`, loads configuration (unless settings were provided),
	/// initializes tracing, then binds and serves until Ctrl+C.
	pub async fn start_server(mut self) -> Result<(), Box<dyn std::error::Error>> {
		dotenvy::dotenv().ok();

		let using_provided_settings = self.settings.is_some();
		let settings = match self.settings.take() {
			Some(settings) => settings,
			None => load_config()?,
		};

		Self::init_tracing_from_settings(&settings);
		log_service_info();
		info!(
			"Using configuration: loaded from {}",
			if using_provided_settings {
				"provided settings"
			} else {
				"config file or defaults"
			}
		);
		log_orchestration_settings(&settings);

		let bind_addr = settings.bind_address();
		let addr: SocketAddr = bind_addr
			.parse()
			.map_err(|e| format!("Invalid bind address '{}': {}", bind_addr, e))?;

		self.settings = Some(settings);
		let orchestrator = self.build().await?;
		let metrics = Arc::clone(orchestrator.metrics());
		let app = create_router().with_state(AppState::new(Arc::new(orchestrator)));

		let listener = tokio::net::TcpListener::bind(addr).await?;

		log_startup_complete(&bind_addr);
		info!("API endpoints available:");
		info!("  GET  /health");
		info!("  GET  /ready");
		info!("  POST /api/v1/orchestrate");
		info!("  GET  /api/v1/providers");
		info!("  PUT  /api/v1/providers/{{id}}/enabled");

		axum::serve(listener, app)
			.with_graceful_shutdown(shutdown_signal())
			.await?;

		if let Err(e) = metrics.flush().await {
			warn!("Failed to flush metrics on shutdown: {}", e);
		}
		log_service_shutdown();
		Ok(())
	}
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		warn!("Failed to listen for shutdown signal: {}", e);
		std::future::pending::<()>().await;
	}
}
