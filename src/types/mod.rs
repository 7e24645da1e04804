//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account state, snapshots and withdrawal receipts
//! - `operation`: Operation script records and identifiers
//! - `error`: Error types for the locking engine

pub mod account;
pub mod error;
pub mod operation;

pub use account::{Account, AccountId, AccountSnapshot, Version, Withdrawal};
pub use error::LedgerError;
pub use operation::{LockMode, OperationOutcome, OperationRecord, OperationType};
