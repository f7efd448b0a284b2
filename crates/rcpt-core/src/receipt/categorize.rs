//! Category assignment for extracted transactions.

use serde::{Deserialize, Serialize};

use crate::models::TransactionType;

/// Category used when no rule applies.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Assigns a category label from a description and transaction type.
///
/// The extraction pipeline never depends on a categorizer; callers plug one
/// in after extraction (a trained text classifier, a lookup service, or the
/// keyword rules below).
pub trait Categorizer {
    fn categorize(&self, description: &str, kind: TransactionType) -> String;
}

/// A keyword and the category it selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub keyword: String,
    pub category: String,
}

/// Keyword rules over the lower-cased description. Income is always
/// "Income"; expenses take the first matching rule.
#[derive(Debug, Clone)]
pub struct KeywordCategorizer {
    rules: Vec<CategoryRule>,
}

impl KeywordCategorizer {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| CategoryRule {
                keyword: r.keyword.trim().to_lowercase(),
                category: r.category,
            })
            .filter(|r| !r.keyword.is_empty())
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }
}

impl Default for KeywordCategorizer {
    fn default() -> Self {
        let rule = |keyword: &str, category: &str| CategoryRule {
            keyword: keyword.to_string(),
            category: category.to_string(),
        };
        Self::new(vec![
            rule("food", "Food"),
            rule("transport", "Transport"),
            rule("uber", "Transport"),
            rule("ola", "Transport"),
            rule("office", "Office Supplies"),
            rule("software", "Software"),
            rule("internet", "Utilities"),
            rule("electricity", "Utilities"),
        ])
    }
}

impl Categorizer for KeywordCategorizer {
    fn categorize(&self, description: &str, kind: TransactionType) -> String {
        if kind == TransactionType::Income {
            return "Income".to_string();
        }

        let lower = description.to_lowercase();
        self.rules
            .iter()
            .find(|r| lower.contains(r.keyword.as_str()))
            .map(|r| r.category.clone())
            .unwrap_or_else(|| UNCATEGORIZED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let categorizer = KeywordCategorizer::default();
        assert_eq!(categorizer.categorize("Uber", TransactionType::Expense), "Transport");
        assert_eq!(categorizer.categorize("Food Order", TransactionType::Expense), "Food");
        assert_eq!(
            categorizer.categorize("City Electricity Board", TransactionType::Expense),
            "Utilities"
        );
        assert_eq!(categorizer.categorize("ABC CAFE", TransactionType::Expense), UNCATEGORIZED);
    }

    #[test]
    fn test_income_is_income() {
        let categorizer = KeywordCategorizer::default();
        assert_eq!(categorizer.categorize("Food Order", TransactionType::Income), "Income");
    }

    #[test]
    fn test_custom_rules_are_normalized() {
        let categorizer = KeywordCategorizer::new(vec![
            CategoryRule {
                keyword: "  CAFE ".to_string(),
                category: "Dining".to_string(),
            },
            CategoryRule {
                keyword: " ".to_string(),
                category: "Never".to_string(),
            },
        ]);
        assert_eq!(categorizer.rules().len(), 1);
        assert_eq!(categorizer.categorize("ABC CAFE", TransactionType::Expense), "Dining");
    }
}
