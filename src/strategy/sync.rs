//! Synchronous processing strategy
//!
//! Applies an operation script one row at a time, in file order, on the
//! calling thread. Withdrawals never overlap, so the result is fully
//! determined by the input; this is the reference against which the
//! concurrent strategy is compared.

use crate::core::{Ledger, LedgerConfig};
use crate::io::csv_format::write_accounts_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, RunSummary};
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Sequential processing strategy
///
/// # Examples
///
/// ```no_run
/// use account_locking_engine::core::LedgerConfig;
/// use account_locking_engine::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let strategy = SyncProcessingStrategy::new(LedgerConfig::default());
/// let mut output = std::io::stdout();
///
/// strategy.process(Path::new("operations.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    ledger_config: LedgerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(ledger_config: LedgerConfig) -> Self {
        Self { ledger_config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<RunSummary, LedgerError> {
        let ledger = Ledger::new(self.ledger_config.clone());
        let reader = SyncReader::new(input_path)?;
        let mut summary = RunSummary::default();

        for row in reader {
            match row {
                Ok(record) => {
                    let result = ledger.apply(&record);
                    summary.record(&record, &result);
                }
                Err(e) => warn!("Skipping row: {}", e),
            }
        }

        info!(
            attempted = summary.attempted(),
            opened = summary.opened,
            withdrawn = summary.withdrawn,
            failed = summary.failed,
            "sync run complete"
        );

        write_accounts_csv(&ledger.accounts(), output)?;

        Ok(summary)
    }
}
