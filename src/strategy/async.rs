//! Asynchronous batch processing strategy
//!
//! This module provides a concurrent implementation of the ProcessingStrategy
//! trait. It reads the script in batches and lets every withdrawal in a batch
//! race against the others on tokio's blocking pool.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (opens first, then concurrent withdrawals)
//!     └── Ledger (shared, Arc'd)
//!         ├── PessimisticWithdrawer
//!         ├── OptimisticWithdrawer
//!         └── InMemoryAccountStore
//! ```
//!
//! Batches are processed one after another: a withdrawal never races with a
//! row from a later batch. Within a batch, the outcome of optimistic
//! withdrawals on a shared account depends on the interleaving.

use crate::core::{BatchProcessor, Ledger, LedgerConfig};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_accounts_csv;
use crate::strategy::{ProcessingStrategy, RunSummary};
use crate::types::LedgerError;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of records per batch
    pub batch_size: usize,
    /// Maximum number of withdrawals running at once
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent = if max_concurrent == 0 {
            warn!(
                "Invalid max_concurrent ({}), using default ({})",
                max_concurrent, default.max_concurrent
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            batch_size,
            max_concurrent,
        }
    }
}

/// Concurrent batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    ledger_config: LedgerConfig,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy
    pub fn new(config: BatchConfig, ledger_config: LedgerConfig) -> Self {
        Self {
            config,
            ledger_config,
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Apply the script batch by batch on a multi-threaded tokio runtime
    ///
    /// The blocking pool is capped at `max_concurrent` threads, which bounds how
    /// many withdrawals contend at the same time.
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<RunSummary, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent)
            .max_blocking_threads(self.config.max_concurrent)
            .build()?;

        runtime.block_on(async {
            let ledger = Arc::new(Ledger::new(self.ledger_config.clone()));
            let processor = BatchProcessor::new(Arc::clone(&ledger));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::NotFound => LedgerError::FileNotFound {
                        path: input_path.display().to_string(),
                    },
                    _ => LedgerError::from(e),
                })?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut summary = RunSummary::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for processed in processor.process_batch(batch).await {
                    summary.record(&processed.record, &processed.result);
                }
            }

            info!(
                attempted = summary.attempted(),
                opened = summary.opened,
                withdrawn = summary.withdrawn,
                failed = summary.failed,
                conflicts = summary.conflicts,
                "async run complete"
            );

            write_accounts_csv(&ledger.accounts(), output)?;

            Ok(summary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);

        assert_eq!(config, BatchConfig::default());
    }

    #[test]
    fn test_async_strategy_concurrent_pessimistic_withdrawals() {
        let mut csv_content = String::from("type,account,amount\nopen,,1000.00\n");
        for _ in 0..10 {
            csv_content.push_str("pessimistic,1,100.00\n");
        }
        let file = create_temp_csv(&csv_content);
        let strategy =
            AsyncProcessingStrategy::new(BatchConfig::new(100, 4), LedgerConfig::default());
        let mut output = Vec::new();

        let summary = strategy.process(file.path(), &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "account,balance,version\n1,0.00,10\n");
        assert_eq!(summary.withdrawn, 10);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn test_async_strategy_optimistic_conflicts_conserve_balance() {
        let mut csv_content = String::from("type,account,amount\nopen,,1000.00\n");
        for _ in 0..10 {
            csv_content.push_str("optimistic,1,100.00\n");
        }
        let file = create_temp_csv(&csv_content);
        let strategy =
            AsyncProcessingStrategy::new(BatchConfig::new(100, 4), LedgerConfig::default());
        let mut output = Vec::new();

        let summary = strategy.process(file.path(), &mut output).unwrap();

        // Whatever the interleaving, the balance reflects exactly the commits
        let expected_balance = 1000 - 100 * summary.withdrawn;
        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!(
                "account,balance,version\n1,{}.00,{}\n",
                expected_balance, summary.withdrawn
            )
        );
        assert_eq!(summary.withdrawn + summary.conflicts, 10);
    }

    #[test]
    fn test_async_strategy_maintains_ordering_across_batches() {
        // Batches of two: the open and the first withdrawal land in one batch,
        // the remaining withdrawals only start once it is finished.
        let csv_content = "type,account,amount\n\
                          open,,100.00\n\
                          pessimistic,1,30.00\n\
                          pessimistic,1,20.00\n\
                          pessimistic,1,10.00\n";
        let file = create_temp_csv(csv_content);
        let strategy =
            AsyncProcessingStrategy::new(BatchConfig::new(2, 2), LedgerConfig::default());
        let mut output = Vec::new();

        strategy.process(file.path(), &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "account,balance,version\n1,40.00,3\n");
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let strategy =
            AsyncProcessingStrategy::new(BatchConfig::default(), LedgerConfig::default());
        let mut output = Vec::new();

        let result = strategy.process(Path::new("nonexistent.csv"), &mut output);

        assert!(matches!(result, Err(LedgerError::FileNotFound { .. })));
    }
}
