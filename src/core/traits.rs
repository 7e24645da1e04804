//! Core traits for account storage and withdrawal strategies
//!
//! `AccountStore` is the persistence collaborator both locking disciplines talk
//! to; `Withdrawer` lets callers, the contention harness and the script runner
//! drive either discipline through one interface.

use crate::types::{AccountId, AccountSnapshot, LedgerError, Version, Withdrawal};
use rust_decimal::Decimal;
use std::time::Duration;

/// How `read_for_update` should read the account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Point-in-time snapshot, never blocks, holds nothing
    Shared,

    /// Exclusive section scoped to the read closure
    ///
    /// `timeout` bounds the wait for a concurrent holder; `None` waits
    /// indefinitely.
    Exclusive { timeout: Option<Duration> },
}

/// Account state holder exposing the read/commit primitives
///
/// Implementations must make `commit`'s compare-then-write atomic with respect
/// to other commits, and must never let contention on one account block
/// another.
pub trait AccountStore: Send + Sync {
    /// Allocate a new account at version 0
    ///
    /// Fails with `InvalidAmount` if `initial_balance` is negative.
    fn create(&self, initial_balance: Decimal) -> Result<AccountId, LedgerError>;

    /// Read the account and run `f` on the snapshot
    ///
    /// With `Access::Exclusive`, exclusivity is held for the duration of `f`
    /// and released on every exit path, including unwinding. With
    /// `Access::Shared`, `f` runs on a copy and nothing is held.
    fn read_for_update<F, R>(
        &self,
        account: AccountId,
        access: Access,
        f: F,
    ) -> Result<R, LedgerError>
    where
        F: FnOnce(AccountSnapshot) -> Result<R, LedgerError>;

    /// Write a new balance and bump the version by one
    ///
    /// With `Some(expected)`, the write only happens if the stored version is
    /// still `expected`; otherwise `VersionConflict` is returned and nothing
    /// changes. With `None`, the write is unconditional and must only be issued
    /// from inside an exclusive section.
    ///
    /// Returns the new version.
    fn commit(
        &self,
        account: AccountId,
        new_balance: Decimal,
        expected_version: Option<Version>,
    ) -> Result<Version, LedgerError>;

    /// Non-blocking snapshot of the account
    fn read(&self, account: AccountId) -> Result<AccountSnapshot, LedgerError> {
        self.read_for_update(account, Access::Shared, Ok)
    }
}

/// A withdrawal discipline
pub trait Withdrawer: Send + Sync {
    /// Withdraw `amount` from `account` if the balance covers it
    fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<Withdrawal, LedgerError>;
}

/// Decimal places money is held at
pub(crate) const MONEY_SCALE: u32 = 2;

/// Whether `amount` is a whole number of minor units
///
/// Trailing zeros do not count: `1.500` is accepted, `0.004` is not.
pub(crate) fn is_minor_units(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}

/// Reject zero, negative and sub-cent withdrawal amounts
pub(crate) fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO || !is_minor_units(amount) {
        return Err(LedgerError::invalid_amount(amount));
    }
    Ok(())
}
