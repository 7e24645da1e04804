//! Ledger facade
//!
//! This module provides the `Ledger` that exposes the engine's external
//! operations over one shared store:
//! - `create_account`
//! - `withdraw_pessimistic`
//! - `withdraw_optimistic`
//! - `get_balance`
//!
//! Both withdrawers share the same `Arc`'d store, so pessimistic and optimistic
//! callers can be mixed on one account.

use crate::core::account_store::InMemoryAccountStore;
use crate::core::optimistic::OptimisticWithdrawer;
use crate::core::pessimistic::PessimisticWithdrawer;
use crate::core::retry::{RetryPolicy, RetryingWithdrawer};
use crate::core::traits::{AccountStore, Withdrawer};
use crate::types::{
    Account, AccountId, LedgerError, LockMode, OperationOutcome, OperationRecord, OperationType,
    Withdrawal,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Ledger behaviour knobs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Bound on the wait for exclusive access on the pessimistic path
    pub lock_timeout: Option<Duration>,

    /// Retry policy for the optimistic path
    ///
    /// `None` keeps the single-attempt contract: conflicts go straight back to
    /// the caller.
    pub retry: Option<RetryPolicy>,
}

/// Account ledger offering both locking disciplines
///
/// # Thread Safety
///
/// `Ledger` is `Send + Sync` when its store is, and is meant to be shared
/// behind an `Arc` by concurrent callers.
#[derive(Debug)]
pub struct Ledger<S: AccountStore = InMemoryAccountStore> {
    store: Arc<S>,
    pessimistic: PessimisticWithdrawer<S>,
    optimistic: OptimisticWithdrawer<S>,
    retry: Option<RetryPolicy>,
}

impl Ledger<InMemoryAccountStore> {
    /// Create a ledger backed by a fresh in-memory store
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_store(Arc::new(InMemoryAccountStore::new()), config)
    }

    /// All accounts, sorted by ID
    pub fn accounts(&self) -> Vec<Account> {
        self.store.accounts()
    }
}

impl Default for Ledger<InMemoryAccountStore> {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl<S: AccountStore> Ledger<S> {
    /// Create a ledger over an existing store
    pub fn with_store(store: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            pessimistic: PessimisticWithdrawer::new(Arc::clone(&store))
                .with_lock_timeout(config.lock_timeout),
            optimistic: OptimisticWithdrawer::new(Arc::clone(&store)),
            retry: config.retry,
            store,
        }
    }

    /// Open an account with a non-negative balance
    pub fn create_account(&self, initial_balance: Decimal) -> Result<AccountId, LedgerError> {
        self.store.create(initial_balance)
    }

    /// Withdraw while holding exclusive access to the account
    pub fn withdraw_pessimistic(
        &self,
        account: AccountId,
        amount: Decimal,
    ) -> Result<Withdrawal, LedgerError> {
        self.pessimistic.withdraw(account, amount)
    }

    /// Withdraw with a version-checked commit
    ///
    /// Single attempt unless a retry policy was configured.
    pub fn withdraw_optimistic(
        &self,
        account: AccountId,
        amount: Decimal,
    ) -> Result<Withdrawal, LedgerError> {
        match self.retry {
            Some(policy) => {
                RetryingWithdrawer::new(self.optimistic.clone(), policy).withdraw(account, amount)
            }
            None => self.optimistic.withdraw(account, amount),
        }
    }

    /// Withdraw using the given discipline
    pub fn withdraw(
        &self,
        mode: LockMode,
        account: AccountId,
        amount: Decimal,
    ) -> Result<Withdrawal, LedgerError> {
        match mode {
            LockMode::Pessimistic => self.withdraw_pessimistic(account, amount),
            LockMode::Optimistic => self.withdraw_optimistic(account, amount),
        }
    }

    /// Apply one operation script record
    ///
    /// Withdrawal records without an account are rejected as `NotFound` on
    /// account 0, which the store never assigns.
    pub fn apply(&self, record: &OperationRecord) -> Result<OperationOutcome, LedgerError> {
        match record.op_type {
            OperationType::Open => self
                .create_account(record.amount)
                .map(OperationOutcome::Opened),
            OperationType::Withdraw(mode) => {
                let account = record.account.ok_or_else(|| LedgerError::not_found(0))?;
                self.withdraw(mode, account, record.amount)
                    .map(OperationOutcome::Withdrawn)
            }
        }
    }

    /// Current committed balance
    pub fn get_balance(&self, account: AccountId) -> Result<Decimal, LedgerError> {
        Ok(self.store.read(account)?.balance)
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_create_and_get_balance() {
        let ledger = Ledger::new(LedgerConfig::default());

        let id = ledger.create_account(Decimal::new(100000, 2)).unwrap();

        assert_eq!(ledger.get_balance(id), Ok(Decimal::new(100000, 2)));
    }

    #[test]
    fn test_get_balance_unknown_account() {
        let ledger = Ledger::new(LedgerConfig::default());

        assert_eq!(ledger.get_balance(1), Err(LedgerError::not_found(1)));
    }

    #[rstest]
    #[case::pessimistic(LockMode::Pessimistic)]
    #[case::optimistic(LockMode::Optimistic)]
    fn test_insufficient_funds_scenario(#[case] mode: LockMode) {
        let ledger = Ledger::new(LedgerConfig::default());
        let id = ledger.create_account(Decimal::new(10000, 2)).unwrap();

        let result = ledger.withdraw(mode, id, Decimal::new(15000, 2));

        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(ledger.get_balance(id), Ok(Decimal::new(10000, 2)));
    }

    #[rstest]
    #[case::pessimistic(LockMode::Pessimistic)]
    #[case::optimistic(LockMode::Optimistic)]
    fn test_sequential_withdrawals_conserve_balance(#[case] mode: LockMode) {
        let ledger = Ledger::new(LedgerConfig::default());
        let id = ledger.create_account(Decimal::new(100000, 2)).unwrap();

        for _ in 0..4 {
            ledger.withdraw(mode, id, Decimal::new(12550, 2)).unwrap();
        }

        assert_eq!(ledger.get_balance(id), Ok(Decimal::new(49800, 2)));
        assert_eq!(ledger.accounts()[0].version, 4);
    }

    #[test]
    fn test_mixed_disciplines_on_one_account() {
        let ledger = Ledger::new(LedgerConfig::default());
        let id = ledger.create_account(Decimal::new(30000, 2)).unwrap();

        ledger.withdraw_pessimistic(id, Decimal::new(10000, 2)).unwrap();
        ledger.withdraw_optimistic(id, Decimal::new(10000, 2)).unwrap();

        let account = &ledger.accounts()[0];
        assert_eq!(account.balance, Decimal::new(10000, 2));
        assert_eq!(account.version, 2);
    }

    #[test]
    fn test_apply_open_then_withdraw() {
        let ledger = Ledger::new(LedgerConfig::default());

        let opened = ledger
            .apply(&OperationRecord::open(Decimal::new(5000, 2)))
            .unwrap();
        assert_eq!(opened, OperationOutcome::Opened(1));

        let withdrawn = ledger
            .apply(&OperationRecord::withdraw(
                LockMode::Optimistic,
                1,
                Decimal::new(2000, 2),
            ))
            .unwrap();
        assert!(matches!(
            withdrawn,
            OperationOutcome::Withdrawn(Withdrawal { version: 1, .. })
        ));
        assert_eq!(ledger.get_balance(1), Ok(Decimal::new(3000, 2)));
    }

    #[test]
    fn test_apply_withdraw_without_account() {
        let ledger = Ledger::new(LedgerConfig::default());
        let record = OperationRecord {
            op_type: OperationType::Withdraw(LockMode::Pessimistic),
            account: None,
            amount: Decimal::ONE,
        };

        assert_eq!(ledger.apply(&record), Err(LedgerError::not_found(0)));
    }

    #[test]
    fn test_config_is_applied() {
        let config = LedgerConfig {
            lock_timeout: Some(Duration::from_millis(5)),
            retry: Some(RetryPolicy::new(4, Duration::ZERO)),
        };

        let ledger = Ledger::new(config);

        assert_eq!(ledger.retry, Some(RetryPolicy::new(4, Duration::ZERO)));
    }
}
