//! Account Locking Engine Library
//! # Overview
//!
//! An in-memory account store with two withdrawal disciplines racing over the
//! same accounts:
//!
//! - **Pessimistic**: the withdrawer holds exclusive access to the account from
//!   read to commit, so concurrent withdrawals on one account serialize and
//!   none of them is ever lost.
//! - **Optimistic**: the withdrawer reads balance and version without blocking
//!   and commits only if the version is unchanged. A losing racer gets
//!   [`LedgerError::ConcurrentModification`] and may retry.
//!
//! # Architecture
//!
//! - [`types`] - Accounts, operation records and [`LedgerError`]
//! - [`core`] - Store, withdrawers and the [`Ledger`] facade:
//!   - [`core::account_store`] - Versioned accounts with per-account exclusivity
//!   - [`core::pessimistic`] - Read-for-update withdrawals
//!   - [`core::optimistic`] - Compare-and-swap withdrawals
//!   - [`core::retry`] - Opt-in retry for conflicting withdrawals
//! - [`harness`] - Fires N simultaneous withdrawals at one account
//! - [`io`] - CSV operation scripts in, account states out
//! - [`strategy`] - Sequential and batched-concurrent script processing
//! - [`cli`] - CLI arguments parsing
//!
//! # Invariants
//!
//! - A balance never goes negative.
//! - Each successful withdrawal bumps the account version by exactly one.
//! - Final balance equals the opening balance minus the sum of successful
//!   withdrawals, whatever the interleaving.

pub mod cli;
pub mod core;
pub mod harness;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    AccountStore, InMemoryAccountStore, Ledger, LedgerConfig, OptimisticWithdrawer,
    PessimisticWithdrawer, RetryPolicy, RetryingWithdrawer, Withdrawer,
};
pub use harness::{ContentionHarness, ContentionReport};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountId, AccountSnapshot, LedgerError, LockMode, OperationRecord, OperationType,
    Version, Withdrawal,
};
