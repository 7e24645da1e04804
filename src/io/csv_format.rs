//! CSV format handling for operation scripts and account output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to operation records
//! - Account output serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Input format
//!
//! ```text
//! type,account,amount
//! open,,1000.00
//! pessimistic,1,500.00
//! optimistic,1,250.00
//! ```

use crate::types::{Account, AccountId, LedgerError, LockMode, OperationRecord, OperationType};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: type, account, amount.
/// `account` is empty for `open` rows.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    pub account: Option<AccountId>,
    pub amount: Option<String>,
}

/// Convert a CsvRecord to an OperationRecord
///
/// This function:
/// - Parses the type string (case-insensitive) into an OperationType
/// - Parses the amount string into a Decimal
/// - Requires an amount on every row and an account on withdrawal rows
///
/// Sign checks are left to the ledger, which reports them as `InvalidAmount`.
///
/// # Errors
///
/// Returns `LedgerError::ParseError` (without line information) describing the
/// conversion failure.
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<OperationRecord, LedgerError> {
    let op_type = match csv_record.op_type.to_lowercase().as_str() {
        "open" => OperationType::Open,
        "pessimistic" => OperationType::Withdraw(LockMode::Pessimistic),
        "optimistic" => OperationType::Withdraw(LockMode::Optimistic),
        _ => {
            return Err(LedgerError::parse_error(format!(
                "Invalid operation type '{}'",
                csv_record.op_type
            )))
        }
    };

    let amount = match csv_record.amount {
        Some(amount_str) if !amount_str.trim().is_empty() => {
            Decimal::from_str(amount_str.trim()).map_err(|_| {
                LedgerError::parse_error(format!("Invalid amount '{}'", amount_str))
            })?
        }
        _ => {
            return Err(LedgerError::parse_error(format!(
                "'{}' operation requires an amount",
                csv_record.op_type
            )))
        }
    };

    match op_type {
        OperationType::Open => Ok(OperationRecord::open(amount)),
        OperationType::Withdraw(mode) => {
            let account = csv_record.account.ok_or_else(|| {
                LedgerError::parse_error(format!(
                    "'{}' operation requires an account",
                    csv_record.op_type
                ))
            })?;
            Ok(OperationRecord::withdraw(mode, account, amount))
        }
    }
}

/// Write account states to CSV format
///
/// Writes accounts with columns: account, balance, version. Accounts are
/// sorted by ID for deterministic output and balances carry two decimal places.
///
/// # Errors
///
/// Returns `LedgerError::IoError` if writing or flushing fails.
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), LedgerError> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer.write_record(["account", "balance", "version"])?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| account.id);

    for account in sorted_accounts {
        writer.write_record(&[
            account.id.to_string(),
            format!("{:.2}", account.balance),
            account.version.to_string(),
        ])?;
    }

    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn csv_record(op_type: &str, account: Option<AccountId>, amount: Option<&str>) -> CsvRecord {
        CsvRecord {
            op_type: op_type.to_string(),
            account,
            amount: amount.map(|s| s.to_string()),
        }
    }

    #[rstest]
    #[case("pessimistic", LockMode::Pessimistic)]
    #[case("optimistic", LockMode::Optimistic)]
    #[case("PESSIMISTIC", LockMode::Pessimistic)] // case insensitive
    #[case("Optimistic", LockMode::Optimistic)]
    fn test_convert_withdrawal(#[case] op_type: &str, #[case] mode: LockMode) {
        let record = convert_csv_record(csv_record(op_type, Some(3), Some("12.50"))).unwrap();

        assert_eq!(record, OperationRecord::withdraw(mode, 3, Decimal::new(1250, 2)));
    }

    #[test]
    fn test_convert_open_ignores_account_column() {
        let record = convert_csv_record(csv_record("open", Some(9), Some("1000.00"))).unwrap();

        assert_eq!(record, OperationRecord::open(Decimal::new(100000, 2)));
    }

    #[rstest]
    #[case::invalid_type("deposit", Some(1), Some("1.00"), "Invalid operation type")]
    #[case::missing_amount("open", None, None, "requires an amount")]
    #[case::empty_amount("pessimistic", Some(1), Some(""), "requires an amount")]
    #[case::whitespace_amount("optimistic", Some(1), Some("  "), "requires an amount")]
    #[case::invalid_amount("open", None, Some("abc"), "Invalid amount")]
    #[case::missing_account("optimistic", None, Some("1.00"), "requires an account")]
    fn test_convert_csv_record_errors(
        #[case] op_type: &str,
        #[case] account: Option<AccountId>,
        #[case] amount: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let result = convert_csv_record(csv_record(op_type, account, amount));

        let error = result.unwrap_err();
        assert!(matches!(error, LedgerError::ParseError { line: None, .. }));
        assert!(error.to_string().contains(expected_error));
    }

    #[rstest]
    #[case("  100.0  ", Decimal::new(1000, 1))] // whitespace trimming
    #[case("-5", Decimal::new(-5, 0))] // sign checks belong to the ledger
    #[case("0.10", Decimal::new(10, 2))]
    fn test_convert_amount_parsing(#[case] amount_str: &str, #[case] expected: Decimal) {
        let record = convert_csv_record(csv_record("open", None, Some(amount_str))).unwrap();

        assert_eq!(record.amount, expected);
    }

    #[rstest]
    #[case::single_account(
        vec![Account { id: 1, balance: Decimal::new(100000, 2), version: 0 }],
        "account,balance,version\n1,1000.00,0\n"
    )]
    #[case::sorted_by_id(
        vec![
            Account { id: 3, balance: Decimal::ZERO, version: 2 },
            Account { id: 1, balance: Decimal::new(5, 1), version: 1 },
        ],
        "account,balance,version\n1,0.50,1\n3,0.00,2\n"
    )]
    #[case::empty_accounts(vec![], "account,balance,version\n")]
    fn test_write_accounts_csv(#[case] accounts: Vec<Account>, #[case] expected_output: &str) {
        let mut output = Vec::new();
        write_accounts_csv(&accounts, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected_output);
    }
}
