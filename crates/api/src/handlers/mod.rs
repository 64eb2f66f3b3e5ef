pub mod common;
pub mod health;
pub mod orchestrate;
pub mod providers;

pub use health::{health, ready};
pub use orchestrate::post_orchestrate;
pub use providers::{get_providers, put_provider_enabled};
