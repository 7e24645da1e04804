//! Operation-related types for the locking engine
//!
//! This module defines the records read from an operation script: account
//! openings and withdrawals under one of the two locking disciplines.

use super::account::{AccountId, Withdrawal};
use rust_decimal::Decimal;

/// Locking discipline used for a withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Exclusive access is held for the whole read-modify-write
    ///
    /// Serializes every withdrawal on the same account.
    Pessimistic,

    /// Versioned read followed by a compare-and-swap commit
    ///
    /// Conflicts are detected at commit time, not prevented.
    Optimistic,
}

/// Operation types supported by the script runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Create a new account with the given opening balance
    Open,

    /// Withdraw from an existing account using the given discipline
    Withdraw(LockMode),
}

/// Input operation record from CSV
///
/// `account` is absent for `Open` rows because identifiers are assigned by the
/// store; it is always present for withdrawals.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    /// What to do
    pub op_type: OperationType,

    /// Target account (withdrawals only)
    pub account: Option<AccountId>,

    /// Opening balance or withdrawal amount
    pub amount: Decimal,
}

impl OperationRecord {
    /// Build an `Open` record
    pub fn open(amount: Decimal) -> Self {
        OperationRecord {
            op_type: OperationType::Open,
            account: None,
            amount,
        }
    }

    /// Build a withdrawal record
    pub fn withdraw(mode: LockMode, account: AccountId, amount: Decimal) -> Self {
        OperationRecord {
            op_type: OperationType::Withdraw(mode),
            account: Some(account),
            amount,
        }
    }

    /// Whether this record opens an account
    pub fn is_open(&self) -> bool {
        matches!(self.op_type, OperationType::Open)
    }
}

/// Successful result of applying an `OperationRecord`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    /// An account was created with this ID
    Opened(AccountId),

    /// A withdrawal was committed
    Withdrawn(Withdrawal),
}
