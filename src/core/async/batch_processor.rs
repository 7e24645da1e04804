//! Concurrent batch processing of operation records
//!
//! This module provides the `BatchProcessor` struct, which applies a batch of
//! operation records to a shared `Ledger` with every withdrawal in the batch
//! running concurrently.
//!
//! # Design
//!
//! A batch is split into two phases:
//! 1. `Open` records are applied sequentially, in input order, so account IDs
//!    are assigned deterministically
//! 2. Withdrawals are each moved onto tokio's blocking pool and awaited
//!    together; they race for the same accounts exactly as independent
//!    callers would
//!
//! # Thread Safety
//!
//! The processor is cloneable and can be shared across async tasks; all state
//! lives in the `Arc`'d ledger.

use std::sync::Arc;

use crate::core::{AccountStore, InMemoryAccountStore, Ledger};
use crate::types::{LedgerError, OperationOutcome, OperationRecord};
use tracing::error;

/// Result of applying a single operation record
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The record that was applied
    pub record: OperationRecord,

    /// The outcome (success or business failure)
    pub result: Result<OperationOutcome, LedgerError>,
}

/// Applies batches of records with concurrent withdrawals
#[derive(Debug)]
pub struct BatchProcessor<S: AccountStore = InMemoryAccountStore> {
    /// Shared ledger
    ledger: Arc<Ledger<S>>,
}

impl<S: AccountStore> Clone for BatchProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<S: AccountStore + 'static> BatchProcessor<S> {
    /// Create a new BatchProcessor over a shared ledger
    pub fn new(ledger: Arc<Ledger<S>>) -> Self {
        Self { ledger }
    }

    /// Split a batch into account openings and withdrawals
    ///
    /// Both halves keep their original relative order.
    pub fn partition_opens(
        &self,
        batch: Vec<OperationRecord>,
    ) -> (Vec<OperationRecord>, Vec<OperationRecord>) {
        batch.into_iter().partition(OperationRecord::is_open)
    }

    /// Apply a batch
    ///
    /// Opens are applied first in order; then every withdrawal is spawned on
    /// the blocking pool and all of them are awaited. Results for opens come
    /// first and keep input order; withdrawal results follow in spawn order.
    ///
    /// # Guarantees
    ///
    /// - Every record is applied exactly once and gets exactly one result
    /// - Business failures are captured in the results, never propagated
    /// - A panic inside a withdrawal is resumed on the awaiting task
    pub async fn process_batch(&self, batch: Vec<OperationRecord>) -> Vec<ProcessingResult> {
        let (opens, withdrawals) = self.partition_opens(batch);
        let mut results = Vec::with_capacity(opens.len() + withdrawals.len());

        for record in opens {
            let result = self.ledger.apply(&record);
            results.push(ProcessingResult { record, result });
        }

        let mut tasks = Vec::with_capacity(withdrawals.len());
        for record in withdrawals {
            let ledger = Arc::clone(&self.ledger);
            let task_record = record.clone();
            let task = tokio::task::spawn_blocking(move || {
                let result = ledger.apply(&task_record);
                ProcessingResult {
                    record: task_record,
                    result,
                }
            });
            tasks.push((record, task));
        }

        for (record, task) in tasks {
            match task.await {
                Ok(result) => results.push(result),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    error!(?record, "Withdrawal task cancelled: {}", e);
                    results.push(ProcessingResult {
                        record,
                        result: Err(LedgerError::IoError {
                            message: e.to_string(),
                        }),
                    });
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Access, LedgerConfig};
    use crate::types::{AccountId, AccountSnapshot, LockMode, Version};
    use rust_decimal::Decimal;

    fn processor() -> (Arc<Ledger>, BatchProcessor) {
        let ledger = Arc::new(Ledger::new(LedgerConfig::default()));
        (Arc::clone(&ledger), BatchProcessor::new(ledger))
    }

    #[test]
    fn test_partition_opens_keeps_order() {
        let (_ledger, processor) = processor();
        let batch = vec![
            OperationRecord::withdraw(LockMode::Pessimistic, 1, Decimal::ONE),
            OperationRecord::open(Decimal::TEN),
            OperationRecord::withdraw(LockMode::Optimistic, 2, Decimal::TWO),
            OperationRecord::open(Decimal::ONE),
        ];

        let (opens, withdrawals) = processor.partition_opens(batch);

        assert_eq!(
            opens,
            vec![
                OperationRecord::open(Decimal::TEN),
                OperationRecord::open(Decimal::ONE)
            ]
        );
        assert_eq!(withdrawals[0].account, Some(1));
        assert_eq!(withdrawals[1].account, Some(2));
    }

    #[tokio::test]
    async fn test_process_batch_opens_before_withdrawals() {
        let (ledger, processor) = processor();
        let batch = vec![
            OperationRecord::withdraw(LockMode::Pessimistic, 1, Decimal::new(4000, 2)),
            OperationRecord::open(Decimal::new(10000, 2)),
        ];

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.result.is_ok()));
        assert_eq!(ledger.get_balance(1), Ok(Decimal::new(6000, 2)));
    }

    #[tokio::test]
    async fn test_process_batch_concurrent_pessimistic_withdrawals() {
        let (ledger, processor) = processor();
        let mut batch = vec![OperationRecord::open(Decimal::new(100000, 2))];
        batch.extend(
            (0..10).map(|_| {
                OperationRecord::withdraw(LockMode::Pessimistic, 1, Decimal::new(10000, 2))
            }),
        );

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 11);
        assert!(results.iter().all(|r| r.result.is_ok()));
        assert_eq!(ledger.get_balance(1), Ok(Decimal::ZERO));
        assert_eq!(ledger.accounts()[0].version, 10);
    }

    #[tokio::test]
    async fn test_process_batch_captures_failures() {
        let (ledger, processor) = processor();
        let batch = vec![
            OperationRecord::open(Decimal::new(10000, 2)),
            OperationRecord::withdraw(LockMode::Optimistic, 1, Decimal::new(15000, 2)),
            OperationRecord::withdraw(LockMode::Pessimistic, 9, Decimal::ONE),
        ];

        let results = processor.process_batch(batch).await;

        let failures = results.iter().filter(|r| r.result.is_err()).count();
        assert_eq!(failures, 2);
        assert_eq!(ledger.get_balance(1), Ok(Decimal::new(10000, 2)));
    }

    /// Store whose reads blow up, to check that worker panics surface
    struct FailingStore {
        inner: InMemoryAccountStore,
    }

    impl AccountStore for FailingStore {
        fn create(&self, initial_balance: Decimal) -> Result<AccountId, LedgerError> {
            self.inner.create(initial_balance)
        }

        fn read_for_update<F, R>(
            &self,
            _account: AccountId,
            _access: Access,
            _f: F,
        ) -> Result<R, LedgerError>
        where
            F: FnOnce(AccountSnapshot) -> Result<R, LedgerError>,
        {
            panic!("store unavailable");
        }

        fn commit(
            &self,
            account: AccountId,
            new_balance: Decimal,
            expected_version: Option<Version>,
        ) -> Result<Version, LedgerError> {
            self.inner.commit(account, new_balance, expected_version)
        }
    }

    #[tokio::test]
    #[should_panic(expected = "store unavailable")]
    async fn test_process_batch_resumes_withdrawal_panic() {
        let store = Arc::new(FailingStore {
            inner: InMemoryAccountStore::new(),
        });
        let ledger = Arc::new(Ledger::with_store(store, LedgerConfig::default()));
        let processor = BatchProcessor::new(ledger);
        let batch = vec![
            OperationRecord::open(Decimal::TEN),
            OperationRecord::withdraw(LockMode::Optimistic, 1, Decimal::ONE),
        ];

        processor.process_batch(batch).await;
    }

    #[tokio::test]
    async fn test_process_empty_batch() {
        let (_ledger, processor) = processor();

        assert!(processor.process_batch(vec![]).await.is_empty());
    }
}
