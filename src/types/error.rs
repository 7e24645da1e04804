//! Error types for the locking engine
//!
//! This module defines all error types that can occur while creating accounts,
//! withdrawing under either locking discipline, or driving an operation script.
//!
//! # Error Categories
//!
//! - **Business outcomes**: invalid amount, insufficient funds, unknown account
//! - **Concurrency outcomes**: version conflicts, concurrent modification, lock timeouts
//! - **Driver errors**: file not found, I/O and CSV parsing failures

use crate::types::{AccountId, Version};
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the locking engine
///
/// Every variant is recoverable by the caller; none of them should terminate
/// the process except the driver errors raised before processing starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Non-positive withdrawal amount or negative opening balance
    ///
    /// Caller error, never retried automatically.
    #[error("Invalid amount {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Withdrawal larger than the current balance
    ///
    /// The account is left untouched.
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
    },

    /// Referenced account does not exist
    #[error("Account {account} not found")]
    NotFound { account: AccountId },

    /// Versioned commit rejected by the store
    ///
    /// Internal to the store: the optimistic withdrawer surfaces it as
    /// `ConcurrentModification`. `actual` is the stored version at the time of
    /// the check; it equals `expected` when an exclusive section was in flight.
    #[error("Version conflict on account {account}: expected {expected}, found {actual}")]
    VersionConflict {
        account: AccountId,
        expected: Version,
        actual: Version,
    },

    /// The account changed between the optimistic read and commit
    ///
    /// The caller decides whether to retry with a fresh attempt.
    #[error("Account {account} was modified concurrently (read at version {expected_version})")]
    ConcurrentModification {
        account: AccountId,
        expected_version: Version,
    },

    /// Exclusive access could not be acquired in time
    ///
    /// Nothing is held when this is returned.
    #[error("Lock on account {account} unavailable after {waited_ms}ms")]
    LockUnavailable { account: AccountId, waited_ms: u64 },

    /// Checked decimal subtraction failed
    #[error("Arithmetic underflow on account {account}")]
    ArithmeticUnderflow { account: AccountId },

    /// Input file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// CSV parsing error occurred
    ///
    /// Recoverable: the malformed row is skipped.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        line: Option<u64>,
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        if error.is_io_error() {
            return LedgerError::IoError {
                message: error.to_string(),
            };
        }

        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for LedgerError {
    fn from(error: csv_async::Error) -> Self {
        LedgerError::ParseError {
            line: None,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create a NotFound error
    pub fn not_found(account: AccountId) -> Self {
        LedgerError::NotFound { account }
    }

    /// Create a VersionConflict error
    pub fn version_conflict(account: AccountId, expected: Version, actual: Version) -> Self {
        LedgerError::VersionConflict {
            account,
            expected,
            actual,
        }
    }

    /// Create a ConcurrentModification error
    pub fn concurrent_modification(account: AccountId, expected_version: Version) -> Self {
        LedgerError::ConcurrentModification {
            account,
            expected_version,
        }
    }

    /// Create a LockUnavailable error
    pub fn lock_unavailable(account: AccountId, waited_ms: u64) -> Self {
        LedgerError::LockUnavailable { account, waited_ms }
    }

    /// Create an ArithmeticUnderflow error
    pub fn arithmetic_underflow(account: AccountId) -> Self {
        LedgerError::ArithmeticUnderflow { account }
    }

    /// Create a ParseError without line information
    pub fn parse_error(message: impl Into<String>) -> Self {
        LedgerError::ParseError {
            line: None,
            message: message.into(),
        }
    }

    /// Whether a fresh attempt of the same operation may succeed
    ///
    /// Only an optimistic conflict qualifies; every other outcome is final for
    /// the given input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ConcurrentModification { .. })
    }
}
