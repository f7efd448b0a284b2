//! Total-amount resolution.
//!
//! A receipt carries many numbers: item prices, taxes, discounts, phone
//! numbers, years. Candidates are generated by a cascade of strategies,
//! each run only when the previous one produced nothing, and the
//! highest-priority candidate wins. Ties go to the first one discovered.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::patterns::{AMOUNT_PATTERNS, AMOUNT_TRAILING_GROUP, BANK_CREDIT, BANK_DEBIT};
use super::FieldResolver;
use crate::receipt::KeywordTables;

const PRIORITY_GRAND_TOTAL: u32 = 200;
const PRIORITY_TOTAL_LINE: u32 = 100;
const PRIORITY_NEXT_LINE: u32 = 90;
const PRIORITY_BANK: u32 = 80;
const PRIORITY_LARGEST: u32 = 50;

/// Which rule produced the winning amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountStrategy {
    /// On a line with a grand-total marker.
    GrandTotal,
    /// On a line with a total keyword.
    TotalLine,
    /// On the line following a total keyword.
    NextLine,
    /// Next to a credit/debit label in a bank statement.
    BankStatement,
    /// Largest plausible number in the document.
    LargestNumber,
}

impl AmountStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountStrategy::GrandTotal => "grand_total",
            AmountStrategy::TotalLine => "total_line",
            AmountStrategy::NextLine => "next_line",
            AmountStrategy::BankStatement => "bank_statement",
            AmountStrategy::LargestNumber => "largest_number",
        }
    }
}

/// The amount chosen for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAmount {
    pub value: Decimal,
    pub strategy: AmountStrategy,
    /// Line (or match, for bank statements) the value came from.
    pub source_line: String,
}

#[derive(Debug, Clone)]
struct AmountCandidate {
    value: Decimal,
    priority: u32,
    strategy: AmountStrategy,
    source_line: String,
    line_index: Option<usize>,
}

/// Amount resolver bound to a keyword table.
pub struct AmountResolver<'a> {
    tables: &'a KeywordTables,
}

impl<'a> AmountResolver<'a> {
    pub fn new(tables: &'a KeywordTables) -> Self {
        Self { tables }
    }
}

impl FieldResolver for AmountResolver<'_> {
    type Output = Option<ResolvedAmount>;

    fn resolve(&self, text: &str) -> Self::Output {
        resolve_amount(text, self.tables)
    }
}

/// Pick the single most probable transaction amount, or `None`.
pub fn resolve_amount(text: &str, tables: &KeywordTables) -> Option<ResolvedAmount> {
    let lines: Vec<&str> = text.lines().collect();

    let mut candidates = keyword_candidates(&lines, tables);
    if candidates.is_empty() {
        candidates = bank_candidates(text);
    }
    if candidates.is_empty() {
        candidates = largest_candidate(&lines, tables).into_iter().collect();
    }

    debug!("{} amount candidates", candidates.len());

    // max_by_key keeps the last maximum; fold keeps the first.
    let best = candidates.into_iter().fold(None::<AmountCandidate>, |best, c| match best {
        Some(b) if b.priority >= c.priority => Some(b),
        _ => Some(c),
    })?;

    debug!(
        "Amount {} via {} (line {:?})",
        best.value,
        best.strategy.as_str(),
        best.line_index
    );

    Some(ResolvedAmount {
        value: best.value,
        strategy: best.strategy,
        source_line: best.source_line,
    })
}

/// Lines with a total keyword and no ignore keyword, plus the line after each.
fn keyword_candidates(lines: &[&str], tables: &KeywordTables) -> Vec<AmountCandidate> {
    let mut candidates = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if !tables.has_total(&lower) || tables.is_ignored(&lower) {
            continue;
        }

        let (priority, strategy) = if tables.has_grand_total(&lower) {
            (PRIORITY_GRAND_TOTAL, AmountStrategy::GrandTotal)
        } else {
            (PRIORITY_TOTAL_LINE, AmountStrategy::TotalLine)
        };

        for value in amounts_in_line(line) {
            candidates.push(AmountCandidate {
                value,
                priority,
                strategy,
                source_line: line.to_string(),
                line_index: Some(i),
            });
        }

        if let Some(next) = lines.get(i + 1) {
            for value in amounts_in_line(next) {
                candidates.push(AmountCandidate {
                    value,
                    priority: PRIORITY_NEXT_LINE,
                    strategy: AmountStrategy::NextLine,
                    source_line: next.to_string(),
                    line_index: Some(i + 1),
                });
            }
        }
    }

    candidates
}

/// Credit then debit labels across the whole text. Balances are skipped.
fn bank_candidates(text: &str) -> Vec<AmountCandidate> {
    let mut candidates = Vec::new();

    for pattern in [&*BANK_CREDIT, &*BANK_DEBIT] {
        for caps in pattern.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let Some(value) = clean_amount(m.as_str()) else { continue };
            if is_bare_year(&value) {
                continue;
            }
            candidates.push(AmountCandidate {
                value,
                priority: PRIORITY_BANK,
                strategy: AmountStrategy::BankStatement,
                source_line: caps[0].to_string(),
                line_index: None,
            });
        }
    }

    candidates
}

/// The largest amount on any non-ignored line, as a single candidate.
fn largest_candidate(lines: &[&str], tables: &KeywordTables) -> Option<AmountCandidate> {
    let mut best: Option<(Decimal, &str)> = None;

    for line in lines {
        if tables.is_ignored(&line.to_lowercase()) {
            continue;
        }
        for value in amounts_in_line(line) {
            if value <= Decimal::ONE {
                continue;
            }
            if best.is_none_or(|(b, _)| value > b) {
                best = Some((value, line));
            }
        }
    }

    best.map(|(value, line)| AmountCandidate {
        value,
        priority: PRIORITY_LARGEST,
        strategy: AmountStrategy::LargestNumber,
        source_line: line.to_string(),
        line_index: None,
    })
}

/// Every amount-shaped value on a line, in pattern order then position.
///
/// A span claimed by an earlier pattern is not matched again, so "Rs. 1,250.00"
/// yields one value rather than one per shape. Bare calendar years are dropped.
fn amounts_in_line(line: &str) -> Vec<Decimal> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut values = Vec::new();

    for pattern in AMOUNT_PATTERNS.iter() {
        for caps in pattern.captures_iter(line) {
            let Some(m) = caps.get(1) else { continue };
            if claimed.iter().any(|&(s, e)| m.start() < e && s < m.end()) {
                continue;
            }
            claimed.push((m.start(), m.end()));

            match clean_amount(m.as_str()) {
                Some(value) if !is_bare_year(&value) => values.push(value),
                _ => {}
            }
        }
    }

    values
}

/// A whole number written without decimals in [2000, 2100].
///
/// "2024.00" keeps its scale when parsed and is therefore not a year.
fn is_bare_year(value: &Decimal) -> bool {
    value.scale() == 0 && *value >= Decimal::from(2000) && *value <= Decimal::from(2100)
}

/// Normalize a raw amount match to a decimal.
///
/// Tolerates currency symbols, thousands commas, a stray space between two
/// OCR-merged groups (the trailing group wins) and repeated dots (only the
/// last is the decimal point). Returns `None` when nothing numeric remains.
pub fn clean_amount(raw: &str) -> Option<Decimal> {
    let mut raw = raw.trim();

    if raw.contains(char::is_whitespace) {
        if let Some(last) = raw.split_whitespace().last() {
            if AMOUNT_TRAILING_GROUP.is_match(last) {
                raw = last;
            }
        }
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if !cleaned.contains(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match cleaned.rsplit_once('.') {
        Some((int_part, frac_part)) => {
            let int_part = int_part.replace('.', "");
            let int_part = if int_part.is_empty() {
                "0".to_string()
            } else {
                int_part
            };
            if frac_part.is_empty() {
                int_part
            } else {
                format!("{}.{}", int_part, frac_part)
            }
        }
        None => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}
