//! Test server for HTTP integration tests

use axum::Router;
use llmo_orchestrator::{create_router, OrchestratorBuilder};
use tokio::task::JoinHandle;

/// Running server bound to an ephemeral local port
#[allow(dead_code)]
pub struct TestServer {
	pub base_url: String,
	pub handle: JoinHandle<()>,
}

#[allow(dead_code)]
impl TestServer {
	/// Spawn a server around an orchestrator built from `builder`
	pub async fn spawn_with(builder: OrchestratorBuilder) -> Result<Self, Box<dyn std::error::Error>> {
		let (_router, state) = builder.start().await?;
		let app: Router = create_router().with_state(state);
		Self::spawn_server_with_app(app).await
	}

	/// Spawn a server with no providers registered
	pub async fn spawn_minimal() -> Result<Self, Box<dyn std::error::Error>> {
		Self::spawn_with(OrchestratorBuilder::new().with_settings(super::TestConfigs::fast())).await
	}

	async fn spawn_server_with_app(app: Router) -> Result<Self, Box<dyn std::error::Error>> {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let base_url = format!("http://{}:{}", addr.ip(), addr.port());

		let handle = tokio::spawn(async move {
			let _ = axum::serve(listener, app).await;
		});

		// Give server time to start
		tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

		Ok(Self { base_url, handle })
	}

	pub fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	pub fn abort(self) {
		self.handle.abort();
	}
}
