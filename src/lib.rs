//! Franchise fee and installment schedule service
//!
//! Batch fee ledgers, installment plans, per-student schedules and the
//! balances derived from them, exposed over an administrator HTTP API.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;
pub mod state;

// Re-export commonly used types
pub use modules::fees;
pub use modules::franchises;
pub use modules::installments;
pub use modules::reports;
pub use state::{AppState, Repositories};
