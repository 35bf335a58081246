//! Type definitions for the scoring service

pub mod transaction;
pub mod verdict;

pub use transaction::TransactionRecord;
pub use verdict::{PredictionResult, Verdict};
