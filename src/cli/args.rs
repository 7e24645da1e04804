use crate::core::{LedgerConfig, RetryPolicy};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Apply an account operation script under pessimistic and optimistic locking
#[derive(Parser, Debug)]
#[command(name = "locking-engine")]
#[command(about = "Apply account operations under pessimistic and optimistic locking", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing operation records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' applies rows in order, 'async' races withdrawals within a batch"
    )]
    pub strategy: StrategyType,

    /// Number of records per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of records per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of withdrawals in flight (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of withdrawals running concurrently (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    /// Bound on the wait for exclusive access
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MS",
        help = "Give up on a pessimistic withdrawal after waiting this long for the account (default: wait indefinitely)"
    )]
    pub lock_timeout_ms: Option<u64>,

    /// Total optimistic attempts per withdrawal
    #[arg(
        long = "retries",
        value_name = "COUNT",
        help = "Attempts per optimistic withdrawal, including the first (default: single attempt)"
    )]
    pub retries: Option<u32>,

    /// Base pause between optimistic attempts
    #[arg(
        long = "retry-backoff-ms",
        value_name = "MS",
        default_value_t = 0,
        help = "Pause before retry n is n times this value"
    )]
    pub retry_backoff_ms: u64,
}

/// Available processing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to defaults; zero values are replaced with
    /// defaults by `BatchConfig::new`.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent.unwrap_or(default.max_concurrent),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create a LedgerConfig from CLI arguments
    ///
    /// Retrying is only enabled when `--retries` asks for more than one attempt.
    pub fn to_ledger_config(&self) -> LedgerConfig {
        let retry = self
            .retries
            .filter(|&attempts| attempts > 1)
            .map(|attempts| {
                RetryPolicy::new(attempts, Duration::from_millis(self.retry_backoff_ms))
            });

        LedgerConfig {
            lock_timeout: self.lock_timeout_ms.map(Duration::from_millis),
            retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "input.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "input.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "input.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::all_defaults(&["program", "input.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(
        &["program", "--batch-size", "2000", "input.csv"],
        2000,
        num_cpus::get()
    )]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "input.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "input.csv"], 1000, num_cpus::get())]
    #[case::zero_max_concurrent(
        &["program", "--max-concurrent", "0", "input.csv"],
        1000,
        num_cpus::get()
    )]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent, expected_max_concurrent);
    }

    #[test]
    fn test_ledger_config_defaults() {
        let config = CliArgs::try_parse_from(["program", "input.csv"])
            .unwrap()
            .to_ledger_config();

        assert_eq!(config.lock_timeout, None);
        assert!(config.retry.is_none());
    }

    #[test]
    fn test_ledger_config_custom() {
        let config = CliArgs::try_parse_from([
            "program",
            "--lock-timeout-ms",
            "250",
            "--retries",
            "5",
            "--retry-backoff-ms",
            "2",
            "input.csv",
        ])
        .unwrap()
        .to_ledger_config();

        assert_eq!(config.lock_timeout, Some(Duration::from_millis(250)));
        let retry = config.retry.unwrap();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.backoff, Duration::from_millis(2));
    }

    #[rstest]
    #[case::zero(&["program", "--retries", "0", "input.csv"])]
    #[case::single_attempt(&["program", "--retries", "1", "input.csv"])]
    fn test_single_attempt_disables_retry(#[case] args: &[&str]) {
        let config = CliArgs::try_parse_from(args).unwrap().to_ledger_config();

        assert!(config.retry.is_none());
    }

    #[rstest]
    #[case::missing_input(&["program"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "input.csv"])]
    #[case::negative_timeout(&["program", "--lock-timeout-ms", "-5", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }
}
