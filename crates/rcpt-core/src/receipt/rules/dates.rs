//! Transaction date resolution.

use chrono::NaiveDate;
use regex::Captures;

use super::patterns::{
    month_from_name, DATE_DAY_MONTH_NAME, DATE_DMY, DATE_MONTH_NAME_DAY, DATE_YMD,
};
use super::FieldResolver;

/// Date resolver with a fixed fallback for documents without a date.
pub struct DateResolver {
    today: NaiveDate,
}

impl DateResolver {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Resolver falling back to the local calendar date.
    pub fn local() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

impl FieldResolver for DateResolver {
    type Output = NaiveDate;

    fn resolve(&self, text: &str) -> Self::Output {
        resolve_date(text, self.today)
    }
}

/// Resolve the transaction date, falling back to `today`.
pub fn resolve_date(text: &str, today: NaiveDate) -> NaiveDate {
    find_date(text).unwrap_or(today)
}

/// First parseable date in the text.
///
/// Shapes are tried in order: `DD/MM/YYYY`, `YYYY-MM-DD`, `DD Month YYYY`,
/// `Month DD, YYYY`. Only the first match of each shape is considered; if it
/// is not a real calendar date the next shape is tried.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    DATE_DMY
        .captures(text)
        .and_then(|c| parse_dmy(&c))
        .or_else(|| DATE_YMD.captures(text).and_then(|c| parse_ymd(&c)))
        .or_else(|| {
            DATE_DAY_MONTH_NAME
                .captures(text)
                .and_then(|c| parse_named(&c[1], &c[2], &c[3]))
        })
        .or_else(|| {
            DATE_MONTH_NAME_DAY
                .captures(text)
                .and_then(|c| parse_named(&c[2], &c[1], &c[3]))
        })
}

fn parse_dmy(caps: &Captures) -> Option<NaiveDate> {
    if caps[2] != caps[4] {
        return None;
    }
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[3].parse().ok()?;
    let year = parse_year(&caps[5])?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_ymd(caps: &Captures) -> Option<NaiveDate> {
    if caps[2] != caps[4] {
        return None;
    }
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[3].parse().ok()?;
    let day: u32 = caps[5].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Day, month name and a four-digit year.
fn parse_named(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    if year.len() != 4 {
        return None;
    }
    let day: u32 = day.parse().ok()?;
    let month = month_from_name(month)?;
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Four-digit years as written; two-digit years pivot at 69.
fn parse_year(s: &str) -> Option<i32> {
    let value: i32 = s.parse().ok()?;
    match s.len() {
        4 => Some(value),
        2 if value < 69 => Some(2000 + value),
        2 => Some(1900 + value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_first_numeric() {
        assert_eq!(find_date("Date: 12/03/2024"), Some(date(2024, 3, 12)));
        assert_eq!(find_date("12-03-2024 10:45"), Some(date(2024, 3, 12)));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(find_date("Bill dt 05/11/23"), Some(date(2023, 11, 5)));
        assert_eq!(find_date("05/11/99"), Some(date(1999, 11, 5)));
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(find_date("Txn on 2024-01-31"), Some(date(2024, 1, 31)));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(find_date("15 Mar 2024"), Some(date(2024, 3, 15)));
        assert_eq!(find_date("15 march 2024"), Some(date(2024, 3, 15)));
        assert_eq!(find_date("Paid on Jan 5, 2024"), Some(date(2024, 1, 5)));
        assert_eq!(find_date("February 29 2024"), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_invalid_first_shape_falls_through() {
        // 31/02 is not a date; the ISO date further on still is.
        assert_eq!(
            find_date("Ref 31/02/2024\nPosted 2024-02-28"),
            Some(date(2024, 2, 28))
        );
    }

    #[test]
    fn test_mixed_separators_rejected() {
        assert_eq!(find_date("12/03-2024"), None);
    }

    #[test]
    fn test_fallback_to_today() {
        let today = date(2025, 6, 1);
        assert_eq!(resolve_date("no date here at all", today), today);
        assert_eq!(DateResolver::new(today).resolve("Total 100.00"), today);
    }
}
