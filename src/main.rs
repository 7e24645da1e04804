//! Account locking engine CLI
//!
//! Applies an operation script (account opens plus pessimistic and optimistic
//! withdrawals) and prints the final account states.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > accounts.csv
//! cargo run -- --strategy sync operations.csv > accounts.csv
//! cargo run -- --strategy async --batch-size 500 --max-concurrent 8 operations.csv > accounts.csv
//! cargo run -- --lock-timeout-ms 100 --retries 5 --retry-backoff-ms 1 operations.csv
//! RUST_LOG=debug cargo run -- operations.csv
//! ```
//!
//! # Processing Strategies
//!
//! - **sync**: rows applied one at a time, in file order
//! - **async**: each batch opens its accounts, then races its withdrawals (default)
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use account_locking_engine::cli;
use account_locking_engine::strategy;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics go to stderr so stdout stays a clean CSV
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config, args.to_ledger_config())
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!("{}", e);
        process::exit(1);
    }
}
