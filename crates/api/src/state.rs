use std::sync::Arc;

use llmo_service::OrchestratorTrait;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
	pub orchestrator: Arc<dyn OrchestratorTrait>,
}

impl AppState {
	pub fn new(orchestrator: Arc<dyn OrchestratorTrait>) -> Self {
		Self { orchestrator }
	}
}
