//! Data models and configuration.

pub mod config;
pub mod transaction;

pub use config::{EngineKind, ExtractionConfig, OcrConfig, PreprocessConfig, RcptConfig};
pub use transaction::{ExtractedTransaction, TransactionType};
