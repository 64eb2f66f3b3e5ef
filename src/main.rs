//! LLM Orchestrator Server
//!
//! Main entry point for the orchestration server

use llmo_orchestrator::OrchestratorBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	OrchestratorBuilder::new().start_server().await
}
