//! Explicit table of provider adapters, populated at startup

use llmo_config::Settings;
use llmo_types::{ProviderAdapter, ProviderResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::ProviderFactory;

/// Registered provider adapters keyed by provider id
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
	adapters: BTreeMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build adapters for every configured provider, enabled or not
	///
	/// Disabled providers are still registered so an operator can switch
	/// them on at runtime.
	pub fn from_settings(settings: &Settings) -> ProviderResult<Self> {
		let mut registry = Self::new();
		for (id, provider) in &settings.providers {
			registry.register(ProviderFactory::create(id, provider)?);
		}
		info!("Registered {} provider adapters", registry.len());
		Ok(registry)
	}

	/// Register an adapter under its own id, replacing any previous one
	pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) -> &mut Self {
		self.adapters.insert(adapter.id().to_string(), adapter);
		self
	}

	pub fn with_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
		self.register(adapter);
		self
	}

	pub fn get(&self, id: &str) -> Option<Arc<dyn ProviderAdapter>> {
		self.adapters.get(id).cloned()
	}

	pub fn ids(&self) -> impl Iterator<Item = &str> {
		self.adapters.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ProviderAdapter>)> {
		self.adapters.iter().map(|(id, adapter)| (id.as_str(), adapter))
	}

	pub fn len(&self) -> usize {
		self.adapters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.adapters.is_empty()
	}
}
