//! Centralized mocks and fixtures for integration tests
//!
//! Each test binary pulls in only what it needs, so unused items are allowed.

pub mod configs;
pub mod providers;
pub mod test_server;

#[allow(unused_imports)]
pub use configs::TestConfigs;
#[allow(unused_imports)]
pub use providers::ProviderFixtures;
#[allow(unused_imports)]
pub use test_server::TestServer;
