//! Pessimistic (mutual-exclusion) withdrawals
//!
//! The whole read-modify-write runs inside an exclusive section on the
//! account, so every withdrawal on that account is serialized and the net
//! effect of any set of concurrent withdrawals equals some serial ordering of
//! them.

use crate::core::traits::{validate_amount, Access, AccountStore, Withdrawer};
use crate::types::{AccountId, LedgerError, Withdrawal};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Withdraws while holding exclusive access to the account
///
/// # Guarantees
///
/// - No lost updates and no double spends: critical sections on one account
///   never overlap
/// - The exclusive section is released on every exit path
/// - The unconditional commit inside the section cannot conflict
#[derive(Debug)]
pub struct PessimisticWithdrawer<S: AccountStore> {
    store: Arc<S>,

    /// Upper bound on the wait for exclusive access (`None` waits forever)
    lock_timeout: Option<Duration>,
}

impl<S: AccountStore> PessimisticWithdrawer<S> {
    /// Create a withdrawer over a shared store
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            lock_timeout: None,
        }
    }

    /// Bound the wait for exclusive access
    ///
    /// An expired wait fails with `LockUnavailable` and leaves nothing held.
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

impl<S: AccountStore> Clone for PessimisticWithdrawer<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            lock_timeout: self.lock_timeout,
        }
    }
}

impl<S: AccountStore> Withdrawer for PessimisticWithdrawer<S> {
    /// Withdraw `amount` under exclusive access
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is zero or negative
    /// - `NotFound` if the account does not exist
    /// - `LockUnavailable` if the configured timeout expired
    /// - `InsufficientFunds` if the balance is below `amount`
    fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<Withdrawal, LedgerError> {
        validate_amount(amount)?;

        let access = Access::Exclusive {
            timeout: self.lock_timeout,
        };

        self.store.read_for_update(account, access, |snapshot| {
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
            let version = self.store.commit(account, new_balance, None)?;

            debug!(account, %amount, version, "pessimistic withdrawal committed");
            Ok(Withdrawal {
                account,
                amount,
                balance: new_balance,
                version,
            })
        })
    }
}
