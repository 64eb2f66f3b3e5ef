//! LLM Orchestrator Storage
//!
//! Metrics store backends: an in-memory store and a durable JSON Lines store.

pub mod jsonl_store;
pub mod memory_store;

pub use jsonl_store::JsonlMetricsStore;
pub use memory_store::MemoryMetricsStore;

pub use llmo_types::storage::{MetricsStore, StorageError, StorageResult, StorageStats};
