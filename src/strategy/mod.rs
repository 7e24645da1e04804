//! Processing strategy module for operation scripts
//!
//! This module defines the Strategy pattern for complete processing pipelines:
//! reading an operation script, applying it to a fresh `Ledger`, and writing
//! the final account states. Strategies differ in how much the withdrawals
//! overlap: the synchronous one applies rows one by one, the asynchronous one
//! lets every withdrawal in a batch race for its account.

use crate::cli::StrategyType;
use crate::core::LedgerConfig;
use crate::types::{LedgerError, OperationOutcome, OperationRecord};
use std::io::Write;
use std::path::Path;
use tracing::warn;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Counters collected while applying a script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Accounts opened
    pub opened: usize,

    /// Withdrawals committed
    pub withdrawn: usize,

    /// Records that failed with a business or concurrency outcome
    pub failed: usize,

    /// Failures that were optimistic conflicts
    pub conflicts: usize,
}

impl RunSummary {
    /// Count one applied record, logging failures
    pub fn record(
        &mut self,
        record: &OperationRecord,
        result: &Result<OperationOutcome, LedgerError>,
    ) {
        match result {
            Ok(OperationOutcome::Opened(_)) => self.opened += 1,
            Ok(OperationOutcome::Withdrawn(_)) => self.withdrawn += 1,
            Err(e) => {
                self.failed += 1;
                if e.is_retryable() {
                    self.conflicts += 1;
                }
                warn!(?record, "Operation failed: {}", e);
            }
        }
    }

    /// Total records applied
    pub fn attempted(&self) -> usize {
        self.opened + self.withdrawn + self.failed
    }
}

/// Processing strategy trait for complete pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Apply the script at `input_path` and write final account states to `output`
    ///
    /// Malformed rows and failed operations are logged and skipped; they never
    /// make this method fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened, the runtime cannot be
    /// built, or output cannot be written.
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<RunSummary, LedgerError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - Sequential (`Sync`) or concurrent (`Async`) processing
/// * `batch_config` - Batch configuration (ignored for sync)
/// * `ledger_config` - Lock timeout and retry settings for the ledger
pub fn create_strategy(
    strategy_type: StrategyType,
    batch_config: Option<BatchConfig>,
    ledger_config: LedgerConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(ledger_config)),
        StrategyType::Async => {
            let config = batch_config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, ledger_config))
        }
    }
}
