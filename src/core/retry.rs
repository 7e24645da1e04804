//! Caller-driven retry for optimistic withdrawals
//!
//! The optimistic withdrawer never retries on its own. `RetryingWithdrawer`
//! is the opt-in wrapper a caller reaches for when a conflict should be
//! answered with a fresh attempt: every retry re-reads the current balance and
//! version and runs the whole protocol again.

use crate::core::traits::Withdrawer;
use crate::types::{AccountId, LedgerError, Withdrawal};
use rust_decimal::Decimal;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// How many times to attempt a withdrawal and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1)
    pub max_attempts: u32,

    /// Base delay; attempt `n` waits `backoff * n` before running
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Create a policy, clamping `max_attempts` to at least one attempt
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Re-runs a withdrawer on retryable failures
#[derive(Debug, Clone)]
pub struct RetryingWithdrawer<W: Withdrawer> {
    inner: W,
    policy: RetryPolicy,
}

impl<W: Withdrawer> RetryingWithdrawer<W> {
    pub fn new(inner: W, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<W: Withdrawer> Withdrawer for RetryingWithdrawer<W> {
    /// Withdraw, retrying only on `ConcurrentModification`
    ///
    /// Every other error is returned immediately. When attempts run out, the
    /// last conflict is returned.
    fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<Withdrawal, LedgerError> {
        let mut attempt = 1;
        loop {
            match self.inner.withdraw(account, amount) {
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    debug!(account, attempt, "withdrawal conflicted, retrying");
                    if !self.policy.backoff.is_zero() {
                        thread::sleep(self.policy.backoff * attempt);
                    }
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}
