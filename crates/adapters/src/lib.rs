//! LLM Orchestrator Adapters
//!
//! Provider adapters and the registry the orchestrator is built from.

pub mod http_adapter;
pub mod registry;

pub use http_adapter::HttpProviderAdapter;
pub use llmo_types::{ProviderAdapter, ProviderError, ProviderResult};
pub use registry::ProviderRegistry;

use llmo_config::{ProviderKind, ProviderSettings};
use std::sync::Arc;
use tracing::debug;

/// Factory for creating provider adapters from configuration
pub struct ProviderFactory;

impl ProviderFactory {
	pub fn create(id: &str, settings: &ProviderSettings) -> ProviderResult<Arc<dyn ProviderAdapter>> {
		debug!("Creating {:?} adapter for provider {}", settings.kind, id);
		match settings.kind {
			ProviderKind::Http => Ok(Arc::new(HttpProviderAdapter::from_settings(id, settings)?)),
		}
	}
}
