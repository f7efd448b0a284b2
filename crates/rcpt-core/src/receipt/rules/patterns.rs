//! Common regex patterns for receipt and statement extraction.
//!
//! Compiled once per process and shared read-only.

use lazy_static::lazy_static;
use regex::Regex;

/// Month names accepted in textual dates (abbreviation, full name).
pub const MONTHS: [(&str, &str); 12] = [
    ("jan", "january"),
    ("feb", "february"),
    ("mar", "march"),
    ("apr", "april"),
    ("may", "may"),
    ("jun", "june"),
    ("jul", "july"),
    ("aug", "august"),
    ("sep", "september"),
    ("oct", "october"),
    ("nov", "november"),
    ("dec", "december"),
];

lazy_static! {
    // Amount shapes. Group 1 is always the number itself.
    pub static ref AMOUNT_CURRENCY_PREFIX: Regex = Regex::new(
        r"(?i)(?:rs\.?|₹|inr|\$|€|£)\s*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?)"
    ).unwrap();

    pub static ref AMOUNT_CURRENCY_SUFFIX: Regex = Regex::new(
        r"(?i)((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?)\s*(?:rs\.?|₹|inr)"
    ).unwrap();

    /// Two decimals, with comma or dot thousands groups ("1.234.56" is an
    /// OCR'd "1,234.56").
    pub static ref AMOUNT_GROUPED_DECIMAL: Regex = Regex::new(
        r"\b((?:\d{1,3}(?:,\d{3})+|\d{1,3}(?:\.\d{3})+|\d+)\.\d{2})\b"
    ).unwrap();

    pub static ref AMOUNT_BARE_INTEGER: Regex = Regex::new(
        r"\b(\d{4,})\b"
    ).unwrap();

    /// Every amount shape, in the order candidates are generated.
    pub static ref AMOUNT_PATTERNS: [&'static Regex; 4] = [
        &*AMOUNT_CURRENCY_PREFIX,
        &*AMOUNT_CURRENCY_SUFFIX,
        &*AMOUNT_GROUPED_DECIMAL,
        &*AMOUNT_BARE_INTEGER,
    ];

    /// Trailing group of an OCR-merged number, e.g. the "470.00" of "2 470.00".
    pub static ref AMOUNT_TRAILING_GROUP: Regex = Regex::new(
        r"^\d+(?:,\d{3})*(?:\.\d{2})?$"
    ).unwrap();

    // Bank-statement amounts adjacent to a credit/debit label.
    pub static ref BANK_CREDIT: Regex = Regex::new(
        r"(?i)(?:cr|credit|credited|deposit|received)\s*:?\s*(?:rs\.?|₹)?\s*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?)"
    ).unwrap();

    pub static ref BANK_DEBIT: Regex = Regex::new(
        r"(?i)(?:dr|debit|debited|withdraw|withdrawn|paid)\s*:?\s*(?:rs\.?|₹)?\s*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?)"
    ).unwrap();

    // Date shapes, tried in this order.
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})([/-])(\d{1,2})([/-])(\d{2,4})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})([/-])(\d{1,2})([/-])(\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s+((?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*)\s+(\d{2,4})\b"
    ).unwrap();

    pub static ref DATE_MONTH_NAME_DAY: Regex = Regex::new(
        r"(?i)\b((?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*)\s+(\d{1,2}),?\s+(\d{4})\b"
    ).unwrap();

    /// Any date shape; used to recognise lines that are only a date.
    pub static ref DATE_ANY: [&'static Regex; 4] = [
        &*DATE_DMY,
        &*DATE_YMD,
        &*DATE_DAY_MONTH_NAME,
        &*DATE_MONTH_NAME_DAY,
    ];

    // Merchant labels. Captures stay on one line.
    pub static ref MERCHANT_LABEL: Regex = Regex::new(
        r"(?im)\b(?:from|to|merchant|vendor|seller|store)[ \t:]+([A-Za-z0-9 \t&.-]+)"
    ).unwrap();

    pub static ref MERCHANT_PAYEE: Regex = Regex::new(
        r"(?im)\b(?:paid to|received from)[ \t:]+([A-Za-z0-9 \t&.-]+)"
    ).unwrap();

    pub static ref MERCHANT_HEADING: Regex = Regex::new(
        r"(?im)^([A-Z][A-Za-z0-9 \t&.-]{2,30})"
    ).unwrap();

    pub static ref MERCHANT_PATTERNS: [&'static Regex; 3] = [
        &*MERCHANT_LABEL,
        &*MERCHANT_PAYEE,
        &*MERCHANT_HEADING,
    ];

    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Collapse whitespace runs to a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Month number for an abbreviated or full English month name.
pub fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .position(|(abbr, full)| name == *abbr || name == *full)
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_from_name() {
        assert_eq!(month_from_name("Mar"), Some(3));
        assert_eq!(month_from_name("MARCH"), Some(3));
        assert_eq!(month_from_name("Sept"), None);
        assert_eq!(month_from_name("Dec"), Some(12));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  ABC \t  CAFE\n"), "ABC CAFE");
    }

    #[test]
    fn test_dmy_does_not_match_inside_iso_date() {
        assert!(!DATE_DMY.is_match("2024-03-12"));
        assert!(DATE_YMD.is_match("2024-03-12"));
    }

    #[test]
    fn test_grouped_decimal_shapes() {
        let found: Vec<_> = AMOUNT_GROUPED_DECIMAL
            .captures_iter("Total: 495.00 and 1,234.56 and 1234.56 and 1.234.56")
            .map(|c| c[1].to_string())
            .collect();
        assert_eq!(found, vec!["495.00", "1,234.56", "1234.56", "1.234.56"]);
    }

    #[test]
    fn test_merchant_heading_stays_on_line() {
        let caps = MERCHANT_HEADING.captures("ABC CAFE\nDate: 12/03/2024").unwrap();
        assert_eq!(&caps[1], "ABC CAFE");
    }
}
