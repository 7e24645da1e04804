//! Thread-safe in-memory account store
//!
//! This module provides `InMemoryAccountStore`, the `AccountStore` used by both
//! locking disciplines.
//!
//! # Design
//!
//! Accounts live in a `DashMap<AccountId, Arc<AccountCell>>`. Every operation
//! clones the cell's `Arc` out of the map and drops the map guard before doing
//! anything that may wait, so contention on one account never blocks a shard
//! holding unrelated accounts.
//!
//! Each cell carries:
//! - a short-lived `parking_lot::Mutex` over `(balance, version, exclusive)`,
//!   held only for the duration of a read or a compare-then-write
//! - a `parking_lot::Condvar` signalled whenever an exclusive section ends
//!
//! Exclusivity is a flag inside the state rather than a long-held mutex, so
//! shared reads and versioned commits never wait behind an exclusive section.
//! A versioned commit issued while an exclusive section is in flight is
//! rejected as a conflict, since the holder may still write.

use crate::core::traits::{is_minor_units, Access, AccountStore};
use crate::types::{Account, AccountId, AccountSnapshot, LedgerError, Version};
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct AccountState {
    balance: Decimal,
    version: Version,
    exclusive: bool,
}

#[derive(Debug)]
struct AccountCell {
    state: Mutex<AccountState>,
    released: Condvar,
}

impl AccountCell {
    fn new(balance: Decimal) -> Self {
        Self {
            state: Mutex::new(AccountState {
                balance,
                version: 0,
                exclusive: false,
            }),
            released: Condvar::new(),
        }
    }

    /// Wait for and take the exclusive flag
    fn acquire(
        &self,
        account: AccountId,
        timeout: Option<Duration>,
    ) -> Result<AccountSnapshot, LedgerError> {
        let started = Instant::now();
        let deadline = timeout.map(|t| started + t);
        let mut state = self.state.lock();

        while state.exclusive {
            match deadline {
                Some(deadline) => {
                    if self.released.wait_until(&mut state, deadline).timed_out()
                        && state.exclusive
                    {
                        return Err(LedgerError::lock_unavailable(
                            account,
                            started.elapsed().as_millis() as u64,
                        ));
                    }
                }
                None => self.released.wait(&mut state),
            }
        }

        state.exclusive = true;
        Ok(AccountSnapshot {
            balance: state.balance,
            version: state.version,
        })
    }

    fn release(&self) {
        self.state.lock().exclusive = false;
        self.released.notify_one();
    }
}

/// Releases the exclusive flag when dropped
///
/// Dropping happens on return, on `?` propagation and while unwinding, so the
/// section can never leak.
struct ExclusiveSection {
    cell: Arc<AccountCell>,
    account: AccountId,
}

impl Drop for ExclusiveSection {
    fn drop(&mut self) {
        self.cell.release();
        debug!(account = self.account, "exclusive section released");
    }
}

/// In-memory `AccountStore` with per-account exclusion
///
/// # Thread Safety
///
/// All methods take `&self` and are safe to call concurrently. The store is
/// meant to be shared behind an `Arc` by every withdrawer.
#[derive(Debug)]
pub struct InMemoryAccountStore {
    /// Account cells by ID
    accounts: DashMap<AccountId, Arc<AccountCell>>,

    /// Next identifier to hand out
    next_id: AtomicU64,
}

impl InMemoryAccountStore {
    /// Create an empty store
    ///
    /// The first account created receives ID 1.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn cell(&self, account: AccountId) -> Result<Arc<AccountCell>, LedgerError> {
        self.accounts
            .get(&account)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::not_found(account))
    }

    /// Snapshots of all accounts sorted by ID
    ///
    /// Each account is read atomically, but the list as a whole is not a
    /// consistent cut across accounts.
    pub fn accounts(&self) -> Vec<Account> {
        let cells: Vec<(AccountId, Arc<AccountCell>)> = self
            .accounts
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut accounts: Vec<Account> = cells
            .into_iter()
            .map(|(id, cell)| {
                let state = cell.state.lock();
                Account {
                    id,
                    balance: state.balance,
                    version: state.version,
                }
            })
            .collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    /// Whether the store holds no accounts
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn create(&self, initial_balance: Decimal) -> Result<AccountId, LedgerError> {
        if initial_balance < Decimal::ZERO || !is_minor_units(initial_balance) {
            return Err(LedgerError::invalid_amount(initial_balance));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.accounts
            .insert(id, Arc::new(AccountCell::new(initial_balance)));
        debug!(account = id, balance = %initial_balance, "account created");
        Ok(id)
    }

    fn read_for_update<F, R>(
        &self,
        account: AccountId,
        access: Access,
        f: F,
    ) -> Result<R, LedgerError>
    where
        F: FnOnce(AccountSnapshot) -> Result<R, LedgerError>,
    {
        let cell = self.cell(account)?;

        match access {
            Access::Shared => {
                let snapshot = {
                    let state = cell.state.lock();
                    AccountSnapshot {
                        balance: state.balance,
                        version: state.version,
                    }
                };
                f(snapshot)
            }
            Access::Exclusive { timeout } => {
                let snapshot = cell.acquire(account, timeout)?;
                let _section = ExclusiveSection {
                    cell: Arc::clone(&cell),
                    account,
                };
                debug!(account, version = snapshot.version, "exclusive section acquired");
                f(snapshot)
            }
        }
    }

    fn commit(
        &self,
        account: AccountId,
        new_balance: Decimal,
        expected_version: Option<Version>,
    ) -> Result<Version, LedgerError> {
        if new_balance < Decimal::ZERO {
            return Err(LedgerError::invalid_amount(new_balance));
        }

        let cell = self.cell(account)?;
        let mut state = cell.state.lock();

        if let Some(expected) = expected_version {
            if state.version != expected || state.exclusive {
                return Err(LedgerError::version_conflict(
                    account,
                    expected,
                    state.version,
                ));
            }
        }

        state.balance = new_balance;
        state.version += 1;
        debug!(account, version = state.version, balance = %new_balance, "commit applied");
        Ok(state.version)
    }
}
