//! LLM Orchestrator API
//!
//! Thin axum surface over the orchestrator, plus provider health and the
//! operator kill-switch.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::create_router;
pub use state::AppState;
