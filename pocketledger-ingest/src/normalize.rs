//! Normalize the amount and date text found in bank CSV exports.
//!
//! Both parsers are total: malformed input yields `None`, never a panic.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Date patterns tried in priority order. chrono's numeric specifiers accept
/// unpadded values, so `%m/%d/%Y` also covers `M/d/yyyy` (and `%d/%m/%Y`
/// covers `d/M/yyyy`).
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
];

/// Parse an amount like `"$1,234.50"`, `"(12.00)"`, or `"-3.99"`.
///
/// Currency symbols, grouping commas, and whitespace are stripped; a leading
/// minus or an opening parenthesis marks the value negative.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let symbols = Regex::new(r"[$€£¥₹₫₩฿,\s]").ok()?;
    let cleaned = symbols.replace_all(trimmed, "");

    let negative = cleaned.starts_with('-') || cleaned.starts_with('(');
    let digits: String = cleaned
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '-'))
        .collect();

    let value: f64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Parse a date in any of the supported patterns, trying them in priority
/// order, then falling back to a looser free-form pass. Returns `None` when
/// nothing yields a valid calendar date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            // %Y accepts bare two-digit years as year 00xx; those are
            // assumed to be in the 2000s
            return Some(if date.year() < 100 {
                date.with_year(date.year() + 2000).unwrap_or(date)
            } else {
                date
            });
        }
    }

    free_form_date(trimmed)
}

/// Looser pass for exports that don't match the known patterns. Only these
/// shapes are recognized: RFC 3339, ISO datetimes with a space or `T`
/// separator, month names without the comma, and two-digit years in
/// `m/d/yy` or `d-Mon-yy` order. Anything else (dotted dates, datetimes
/// with named months) yields `None`.
fn free_form_date(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    for format in ["%b %d %Y", "%B %d %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    // Two-digit years are assumed to be in the 2000s; %y maps 69-99 to the
    // 1900s, so shift those forward a century
    for format in ["%m/%d/%y", "%d-%b-%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(if date.year() < 2000 {
                date.with_year(date.year() + 100).unwrap_or(date)
            } else {
                date
            });
        }
    }
    None
}
