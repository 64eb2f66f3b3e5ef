//! Runtime table of registered providers
//!
//! Identities and adapters are fixed at startup. The only mutable bit per
//! provider is the operator kill-switch, an atomic flag read on every request.

use llmo_adapters::ProviderRegistry;
use llmo_config::Settings;
use llmo_types::constants::limits::DEFAULT_PROVIDER_TIMEOUT_MS;
use llmo_types::{Capability, ProviderAdapter, ProviderIdentity};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// One registered provider
#[derive(Debug)]
pub struct ProviderEntry {
	name: String,
	priority: u32,
	enabled: AtomicBool,
	timeout: Duration,
	adapter: Arc<dyn ProviderAdapter>,
}

impl ProviderEntry {
	pub fn new(identity: ProviderIdentity, adapter: Arc<dyn ProviderAdapter>, timeout: Duration) -> Self {
		Self {
			name: identity.name,
			priority: identity.priority,
			enabled: AtomicBool::new(identity.enabled),
			timeout,
			adapter,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn priority(&self) -> u32 {
		self.priority
	}

	/// Per-attempt timeout
	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	pub fn adapter(&self) -> &Arc<dyn ProviderAdapter> {
		&self.adapter
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled.load(Ordering::Acquire)
	}

	pub fn supports(&self, capability: Capability) -> bool {
		self.adapter.supports(capability)
	}

	pub fn capabilities(&self) -> Vec<Capability> {
		self.adapter.capabilities().to_vec()
	}

	/// Current identity, with the live kill-switch state
	pub fn identity(&self) -> ProviderIdentity {
		ProviderIdentity {
			name: self.name.clone(),
			priority: self.priority,
			enabled: self.is_enabled(),
		}
	}
}

/// Providers in rank order (priority, then name)
#[derive(Debug, Default)]
pub struct ProviderTable {
	entries: Vec<Arc<ProviderEntry>>,
}

impl ProviderTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Pair every registered adapter with its configured identity
	pub fn from_registry(registry: &ProviderRegistry, settings: &Settings) -> Self {
		let mut table = Self::new();
		for (id, adapter) in registry.iter() {
			match settings.providers.get(id) {
				Some(provider) => {
					table.register(provider.identity(id), Arc::clone(adapter), provider.timeout());
				},
				None => {
					warn!(
						"Provider '{}' has no configuration, registering with defaults",
						id
					);
					table.register(
						ProviderIdentity::new(id, u32::MAX),
						Arc::clone(adapter),
						Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS),
					);
				},
			}
		}
		table
	}

	/// Add a provider, replacing any entry with the same name
	pub fn register(
		&mut self,
		identity: ProviderIdentity,
		adapter: Arc<dyn ProviderAdapter>,
		timeout: Duration,
	) -> &mut Self {
		self.entries.retain(|entry| entry.name != identity.name);
		self.entries
			.push(Arc::new(ProviderEntry::new(identity, adapter, timeout)));
		self.entries
			.sort_by(|a, b| (a.priority, a.name.as_str()).cmp(&(b.priority, b.name.as_str())));
		self
	}

	pub fn with_provider(
		mut self,
		identity: ProviderIdentity,
		adapter: Arc<dyn ProviderAdapter>,
		timeout: Duration,
	) -> Self {
		self.register(identity, adapter, timeout);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Arc<ProviderEntry>> {
		self.entries.iter().find(|entry| entry.name == name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<ProviderEntry>> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Flip the kill-switch; returns false for an unknown provider
	pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
		match self.get(name) {
			Some(entry) => {
				let previous = entry.enabled.swap(enabled, Ordering::AcqRel);
				if previous != enabled {
					info!(
						"Provider '{}' {}",
						name,
						if enabled { "enabled" } else { "disabled" }
					);
				}
				true
			},
			None => false,
		}
	}

	/// Whether any registered provider, enabled or not, declares the capability
	pub fn supports_any(&self, capability: Capability) -> bool {
		self.entries.iter().any(|entry| entry.supports(capability))
	}

	/// Enabled providers declaring the capability, in rank order
	pub fn candidates(&self, capability: Capability) -> Vec<Arc<ProviderEntry>> {
		self.entries
			.iter()
			.filter(|entry| entry.is_enabled() && entry.supports(capability))
			.cloned()
			.collect()
	}
}
