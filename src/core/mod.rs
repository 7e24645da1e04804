//! Core business logic module
//!
//! This module contains the concurrency-control components:
//! - `traits` - Store and withdrawer abstractions
//! - `account_store` - In-memory account state with per-account exclusion
//! - `pessimistic` - Withdrawals under exclusive access
//! - `optimistic` - Withdrawals with version-checked commits
//! - `retry` - Opt-in retry wrapper for optimistic conflicts
//! - `ledger` - Facade exposing the engine's external operations
//! - `async` - Concurrent batch driver running withdrawals on tokio's blocking pool

pub mod account_store;
pub mod r#async;
pub mod ledger;
pub mod optimistic;
pub mod pessimistic;
pub mod retry;
pub mod traits;

pub use account_store::InMemoryAccountStore;
pub use r#async::{BatchProcessor, ProcessingResult};
pub use ledger::{Ledger, LedgerConfig};
pub use optimistic::OptimisticWithdrawer;
pub use pessimistic::PessimisticWithdrawer;
pub use retry::{RetryPolicy, RetryingWithdrawer};
pub use traits::{Access, AccountStore, Withdrawer};
