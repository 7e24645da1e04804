//! Account-related types for the locking engine
//!
//! This module defines the Account structure together with the point-in-time
//! snapshot handed out by the store and the receipt returned by a successful
//! withdrawal.

use rust_decimal::Decimal;

/// Account identifier
///
/// Assigned by the store from a monotonically increasing counter starting at 1.
pub type AccountId = u64;

/// Version counter stamped on every account
///
/// Starts at 0 and is incremented by exactly 1 on every successful commit.
pub type Version = u64;

/// Account state
///
/// The only entity managed by the engine. `balance` is fixed-point so repeated
/// commits never accumulate rounding error.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The account ID, immutable after creation
    pub id: AccountId,

    /// Current committed balance, never negative
    pub balance: Decimal,

    /// Optimistic concurrency version
    ///
    /// Used solely for conflict detection, never for business ordering.
    pub version: Version,
}

/// Point-in-time (balance, version) pair read from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub balance: Decimal,
    pub version: Version,
}

/// Receipt of a committed withdrawal
///
/// `balance` and `version` describe the account immediately after the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub account: AccountId,
    pub amount: Decimal,
    pub balance: Decimal,
    pub version: Version,
}
