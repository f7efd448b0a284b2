//! Human-readable description for a transaction.

use super::patterns::{normalize_whitespace, DATE_ANY, MERCHANT_PATTERNS};
use super::FieldResolver;
use crate::models::transaction::truncate_chars;
use crate::receipt::KeywordTables;

/// Returned when nothing better can be found.
pub const DEFAULT_DESCRIPTION: &str = "Transaction";

/// Lines inspected by the first-clean-line rule.
const HEADER_LINES: usize = 5;

/// Upper bound on any description length.
pub const MAX_DESCRIPTION_CHARS: usize = 100;

/// A line this short that holds a date is treated as only a date.
const BARE_DATE_MAX_CHARS: usize = 15;

/// Description resolver bound to a keyword table.
pub struct DescriptionResolver<'a> {
    tables: &'a KeywordTables,
    max_chars: usize,
}

impl<'a> DescriptionResolver<'a> {
    pub fn new(tables: &'a KeywordTables) -> Self {
        Self {
            tables,
            max_chars: MAX_DESCRIPTION_CHARS,
        }
    }

    /// Shorter limit for descriptions, clamped to 1..=100.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.clamp(1, MAX_DESCRIPTION_CHARS);
        self
    }
}

impl FieldResolver for DescriptionResolver<'_> {
    type Output = String;

    fn resolve(&self, text: &str) -> Self::Output {
        resolve_description(text, self.tables, self.max_chars)
    }
}

/// Resolve a non-empty description. First rule to produce one wins:
/// a known merchant, a labelled merchant, the first clean header line,
/// a transaction-type label, then [`DEFAULT_DESCRIPTION`].
pub fn resolve_description(text: &str, tables: &KeywordTables, max_chars: usize) -> String {
    let lower = text.to_lowercase();
    let max_chars = max_chars.clamp(1, MAX_DESCRIPTION_CHARS);

    known_merchant(&lower, tables)
        .or_else(|| labelled_merchant(text))
        .or_else(|| first_clean_line(text, tables))
        .or_else(|| type_label(&lower, tables))
        .map(|description| truncate_chars(&description, max_chars).trim_end().to_string())
        .filter(|description| !description.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string())
}

fn known_merchant(text_lower: &str, tables: &KeywordTables) -> Option<String> {
    tables
        .known_merchants
        .iter()
        .find(|m| text_lower.contains(&m.to_lowercase()))
        .cloned()
}

fn labelled_merchant(text: &str) -> Option<String> {
    for pattern in MERCHANT_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let name = normalize_whitespace(&caps[1]);
        let len = name.chars().count();
        if len > 3 && len < 50 {
            return Some(name);
        }
    }
    None
}

fn first_clean_line(text: &str, tables: &KeywordTables) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(HEADER_LINES)
        .find(|line| is_clean_line(line, tables))
        .map(normalize_whitespace)
}

fn is_clean_line(line: &str, tables: &KeywordTables) -> bool {
    let len = line.chars().count();
    if len < 4 || line.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if len < BARE_DATE_MAX_CHARS && DATE_ANY.iter().any(|p| p.is_match(line)) {
        return false;
    }
    !tables.is_ignored(&line.to_lowercase())
}

fn type_label(text_lower: &str, tables: &KeywordTables) -> Option<String> {
    tables
        .transaction_labels
        .iter()
        .find(|entry| text_lower.contains(entry.keyword.as_str()))
        .map(|entry| entry.label.clone())
}
