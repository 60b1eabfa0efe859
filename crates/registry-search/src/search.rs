//! Search functionality for the dataset registry.
//!
//! This module provides:
//! - The main RegistrySearchManager API
//! - Search engine for evaluating queries over registered records

mod engine;
mod manager;

// Re-export main types
pub use engine::{evaluate, evaluate_parallel, execute_search, select_records, SearchRequest};
pub use manager::RegistrySearchManager;
