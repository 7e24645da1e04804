//! Optimistic (versioned compare-and-swap) withdrawals
//!
//! A withdrawal reads a `(balance, version)` snapshot without locking, computes
//! the new balance and commits it only if the stored version is unchanged.
//! Conflicts are detected, not prevented: a losing attempt fails with
//! `ConcurrentModification` and the caller decides what to do next.

use crate::core::traits::{validate_amount, Access, AccountStore, Withdrawer};
use crate::types::{AccountId, LedgerError, Withdrawal};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Single-attempt optimistic withdrawer
///
/// Never retries internally. Of N attempts that all read the same version,
/// exactly one can commit; the rest observe `ConcurrentModification`.
#[derive(Debug)]
pub struct OptimisticWithdrawer<S: AccountStore> {
    store: Arc<S>,
}

impl<S: AccountStore> OptimisticWithdrawer<S> {
    /// Create a withdrawer over a shared store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: AccountStore> Clone for OptimisticWithdrawer<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccountStore> Withdrawer for OptimisticWithdrawer<S> {
    /// Withdraw `amount` with a version-checked commit
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is zero or negative
    /// - `NotFound` if the account does not exist
    /// - `InsufficientFunds` if the snapshot balance is below `amount`
    /// - `ConcurrentModification` if the account changed after the read
    fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<Withdrawal, LedgerError> {
        validate_amount(amount)?;

        let snapshot = self.store.read_for_update(account, Access::Shared, Ok)?;

        if snapshot.balance < amount {
            return Err(LedgerError::insufficient_funds(
                account,
                snapshot.balance,
                amount,
            ));
        }

        let new_balance = snapshot
            .balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::arithmetic_underflow(account))?;

        let version = self
            .store
            .commit(account, new_balance, Some(snapshot.version))
            .map_err(|e| match e {
                LedgerError::VersionConflict {
                    account, expected, ..
                } => LedgerError::concurrent_modification(account, expected),
                other => other,
            })?;

        debug!(account, %amount, version, "optimistic withdrawal committed");
        Ok(Withdrawal {
            account,
            amount,
            balance: new_balance,
            version,
        })
    }
}
