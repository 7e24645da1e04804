//! Contention harness
//!
//! Fires a set of withdrawals at one account from separate threads, all
//! released together by a start barrier, and tallies what happened. Tests use
//! it to check the locking invariants under real contention; the benchmarks use
//! it to compare the two disciplines.

use crate::core::Withdrawer;
use crate::types::{AccountId, LedgerError, Version, Withdrawal};
use rust_decimal::Decimal;
use std::sync::Barrier;
use std::thread;
use tracing::debug;

/// Outcome counts of one contention run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentionReport {
    /// Withdrawals that committed
    pub successes: usize,

    /// Optimistic attempts that lost the race
    pub conflicts: usize,

    /// Attempts rejected for lack of funds
    pub insufficient: usize,

    /// Any other failure (timeouts, unknown account, invalid amount)
    pub other: usize,

    /// Sum of the amounts that committed
    pub withdrawn: Decimal,

    /// Versions produced by the successful commits, ascending
    pub versions: Vec<Version>,
}

impl ContentionReport {
    /// Total attempts recorded
    pub fn attempts(&self) -> usize {
        self.successes + self.conflicts + self.insufficient + self.other
    }

    fn record(&mut self, amount: Decimal, result: Result<Withdrawal, LedgerError>) {
        match result {
            Ok(withdrawal) => {
                self.successes += 1;
                self.withdrawn += amount;
                self.versions.push(withdrawal.version);
            }
            Err(LedgerError::ConcurrentModification { .. }) => self.conflicts += 1,
            Err(LedgerError::InsufficientFunds { .. }) => self.insufficient += 1,
            Err(e) => {
                debug!(error = %e, "contention attempt failed");
                self.other += 1;
            }
        }
    }
}

/// Launches simultaneous withdrawals against a single account
#[derive(Debug, Clone, Copy)]
pub struct ContentionHarness {
    workers: usize,
}

impl ContentionHarness {
    /// Harness running `workers` threads per [`run`](Self::run)
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Every worker attempts to withdraw `amount` from `account` once
    pub fn run<W: Withdrawer>(
        &self,
        withdrawer: &W,
        account: AccountId,
        amount: Decimal,
    ) -> ContentionReport {
        let amounts = vec![amount; self.workers];
        self.run_amounts(withdrawer, account, &amounts)
    }

    /// One thread per entry in `amounts`, all started at the same instant
    ///
    /// Ignores the configured worker count.
    pub fn run_amounts<W: Withdrawer>(
        &self,
        withdrawer: &W,
        account: AccountId,
        amounts: &[Decimal],
    ) -> ContentionReport {
        let barrier = Barrier::new(amounts.len());

        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = amounts
                .iter()
                .map(|&amount| {
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        (amount, withdrawer.withdraw(account, amount))
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(outcome) => outcome,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        });

        let mut report = ContentionReport::default();
        for (amount, result) in results {
            report.record(amount, result);
        }
        report.versions.sort_unstable();

        debug!(
            account,
            successes = report.successes,
            conflicts = report.conflicts,
            insufficient = report.insufficient,
            other = report.other,
            "contention run complete"
        );

        report
    }
}
