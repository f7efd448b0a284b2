//! Transaction record produced by one extraction call.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of money flow for an extracted transaction.
///
/// There is no "unknown" variant: classification always falls back to
/// [`TransactionType::Expense`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

impl Default for TransactionType {
    fn default() -> Self {
        Self::Expense
    }
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transaction extracted from a receipt, bill or statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTransaction {
    /// Transaction date (serialized as `YYYY-MM-DD`).
    pub date: NaiveDate,

    /// Short human-readable label, 1-100 characters, trimmed.
    pub description: String,

    /// Transaction amount, always positive.
    pub amount: Decimal,

    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// Leading part of the recognized text, for diagnostics only.
    pub raw_text_sample: String,
}

impl ExtractedTransaction {
    /// Check the record invariants, returning a list of violations.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.amount <= Decimal::ZERO {
            issues.push(format!("amount must be positive, got {}", self.amount));
        }

        let chars = self.description.chars().count();
        if chars == 0 || chars > 100 {
            issues.push(format!("description length {} outside 1-100", chars));
        }
        if self.description.trim() != self.description {
            issues.push("description is not trimmed".to_string());
        }

        if self.raw_text_sample.chars().count() > 500 {
            issues.push("raw text sample longer than 500 characters".to_string());
        }

        issues
    }
}

/// Take at most `max_chars` characters from `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
