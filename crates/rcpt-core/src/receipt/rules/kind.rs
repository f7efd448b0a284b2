//! Income/expense classification.

use super::FieldResolver;
use crate::models::TransactionType;
use crate::receipt::KeywordTables;

/// Keyword-count classifier. Never abstains.
pub struct KindClassifier<'a> {
    tables: &'a KeywordTables,
}

impl<'a> KindClassifier<'a> {
    pub fn new(tables: &'a KeywordTables) -> Self {
        Self { tables }
    }
}

impl FieldResolver for KindClassifier<'_> {
    type Output = TransactionType;

    fn resolve(&self, text: &str) -> Self::Output {
        classify(text, self.tables)
    }
}

/// `Income` only when more income indicators than expense indicators are
/// present; ties and empty text are `Expense`.
///
/// Each indicator counts once no matter how often it occurs. Matching is
/// substring-based, so "credited" also counts "credit".
pub fn classify(text: &str, tables: &KeywordTables) -> TransactionType {
    let lower = text.to_lowercase();
    let income = count_present(&lower, &tables.income);
    let expense = count_present(&lower, &tables.expense);

    if income > expense {
        TransactionType::Income
    } else {
        TransactionType::Expense
    }
}

fn count_present(text_lower: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|k| text_lower.contains(k.as_str()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str) -> TransactionType {
        classify(text, &KeywordTables::default().normalized())
    }

    #[test]
    fn test_salary_credit_is_income() {
        assert_eq!(
            kind("Salary credited to A/c XX1234"),
            TransactionType::Income
        );
    }

    #[test]
    fn test_purchase_is_expense() {
        assert_eq!(kind("Purchase at store, amount debited"), TransactionType::Expense);
    }

    #[test]
    fn test_tie_defaults_to_expense() {
        // "refund" (income) against "order" (expense).
        assert_eq!(kind("Refund for order"), TransactionType::Expense);
    }

    #[test]
    fn test_no_indicators_is_expense() {
        assert_eq!(kind("ABC CAFE\nTotal: 495.00"), TransactionType::Expense);
        assert_eq!(kind(""), TransactionType::Expense);
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        // income: refund; expense: paid, order.
        assert_eq!(
            kind("refund refund refund refund paid order"),
            TransactionType::Expense
        );
    }

    #[test]
    fn test_resolver_trait_matches_function() {
        let tables = KeywordTables::default().normalized();
        assert_eq!(
            KindClassifier::new(&tables).resolve("Amount received, deposit done"),
            TransactionType::Income
        );
    }
}
