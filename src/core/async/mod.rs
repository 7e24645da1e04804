//! Asynchronous drivers for the ledger
//!
//! The ledger itself is synchronous: pessimistic withdrawals park the calling
//! thread while another holder owns the account. This module runs ledger
//! operations from a tokio runtime by moving each one onto the blocking pool,
//! so withdrawals in a batch genuinely contend with each other.

pub mod batch_processor;

pub use batch_processor::{BatchProcessor, ProcessingResult};
