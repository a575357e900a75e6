//! CSV import: tabular parse, column auto-detection, and conversion of rows
//! into draft transactions with per-row error reporting.
//!
//! The caller (the import UI or CLI) owns file selection and decoding, shows
//! the detected column mapping for confirmation, and merges the resulting
//! drafts into the store.

use std::collections::HashMap;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use pocketledger_core::{detect_category, detect_kind, TransactionDraft, TxKind};

use crate::normalize::{parse_amount, parse_date};

/// A data row keyed by lower-cased, trimmed header name.
pub type CsvRow = HashMap<String, String>;

/// At most this many error strings are kept in a parse result; `skipped`
/// still counts every failed row.
const MAX_ERRORS: usize = 10;

/// Which CSV column plays which semantic role. `amount` and `date` are
/// required and stay empty when auto-detection finds no candidate — the
/// caller must surface that gap before parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnMapping {
    pub amount: String,
    pub date: String,
    pub category: Option<String>,
    pub note: Option<String>,
    pub merchant: Option<String>,
    /// Income/expense column, when the export carries one
    pub kind: Option<String>,
}

/// Outcome of a CSV-to-transactions run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CsvParseResult {
    pub success: bool,
    pub drafts: Vec<TransactionDraft>,
    pub errors: Vec<String>,
    pub skipped: usize,
    pub total: usize,
}

fn read_records(raw: &str) -> Vec<csv::StringRecord> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.trim().as_bytes());
    reader.into_records().filter_map(|r| r.ok()).collect()
}

/// Header names from line 1, original casing preserved for display.
pub fn csv_headers(raw: &str) -> Vec<String> {
    read_records(raw)
        .first()
        .map(|record| record.iter().map(|h| h.trim().to_string()).collect())
        .unwrap_or_default()
}

/// Split raw CSV text into data rows keyed by lower-cased header name.
/// Rows whose field count does not match the header are dropped.
pub fn parse_csv_rows(raw: &str) -> Vec<CsvRow> {
    let records = read_records(raw);
    let Some((header, rows)) = records.split_first() else {
        return Vec::new();
    };
    let headers: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();

    rows.iter()
        .filter(|record| record.len() == headers.len())
        .map(|record| {
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(|value| value.trim().to_string()))
                .collect()
        })
        .collect()
}

const AMOUNT_HEADERS: &[&str] = &["amount", "value", "total", "sum", "price", "cost", "money"];
const DATE_HEADERS: &[&str] = &["date", "time", "when", "day", "timestamp"];
const CATEGORY_HEADERS: &[&str] = &["category", "type", "group", "class"];
const NOTE_HEADERS: &[&str] = &["note", "description", "memo", "details", "name", "item"];
const MERCHANT_HEADERS: &[&str] = &["merchant", "vendor", "store", "shop", "payee", "from", "to"];
const KIND_HEADERS: &[&str] = &["type", "transaction type", "kind", "income/expense"];

/// First header (in file order) matching any of the role's keywords.
fn find_column(headers: &[String], keywords: &[&str], exact: bool) -> Option<String> {
    headers
        .iter()
        .find(|header| {
            let lower = header.to_lowercase();
            keywords
                .iter()
                .any(|k| if exact { lower == *k } else { lower.contains(k) })
        })
        .cloned()
}

/// Guess the column mapping from header names. The kind column only binds on
/// an exact header match ("type" as a substring would grab too much).
pub fn auto_detect_columns(headers: &[String]) -> ColumnMapping {
    ColumnMapping {
        amount: find_column(headers, AMOUNT_HEADERS, false).unwrap_or_default(),
        date: find_column(headers, DATE_HEADERS, false).unwrap_or_default(),
        category: find_column(headers, CATEGORY_HEADERS, false),
        note: find_column(headers, NOTE_HEADERS, false),
        merchant: find_column(headers, MERCHANT_HEADERS, false),
        kind: find_column(headers, KIND_HEADERS, true),
    }
}

fn cell<'a>(row: &'a CsvRow, column: &str) -> &'a str {
    if column.is_empty() {
        return "";
    }
    row.get(&column.to_lowercase()).map(String::as_str).unwrap_or("")
}

fn optional_cell<'a>(row: &'a CsvRow, column: Option<&str>) -> &'a str {
    column.map(|c| cell(row, c)).unwrap_or("")
}

/// Convert mapped rows into draft transactions.
///
/// A row with an unparseable (or exactly zero) amount or an unparseable date
/// is skipped and recorded as an error, never defaulted. Sign information is
/// folded into the kind and the stored amount is absolute.
pub fn parse_transactions(rows: &[CsvRow], mapping: &ColumnMapping) -> CsvParseResult {
    let mut drafts = Vec::new();
    let mut errors = Vec::new();
    let mut skipped = 0usize;

    for (i, row) in rows.iter().enumerate() {
        // +2 for the header line and zero-based index
        let row_num = i + 2;

        let amount_text = cell(row, &mapping.amount);
        let amount = match parse_amount(amount_text) {
            Some(a) if a != 0.0 => a,
            _ => {
                skipped += 1;
                if errors.len() < MAX_ERRORS {
                    errors.push(format!(
                        "Row {row_num}: invalid or missing amount \"{amount_text}\""
                    ));
                }
                continue;
            }
        };

        let date_text = cell(row, &mapping.date);
        let Some(date) = parse_date(date_text) else {
            skipped += 1;
            if errors.len() < MAX_ERRORS {
                errors.push(format!(
                    "Row {row_num}: invalid or missing date \"{date_text}\""
                ));
            }
            continue;
        };

        let note = optional_cell(row, mapping.note.as_deref());
        let merchant = optional_cell(row, mapping.merchant.as_deref());
        let category_text = optional_cell(row, mapping.category.as_deref());
        let kind_text = optional_cell(row, mapping.kind.as_deref());

        let category = if category_text.is_empty()
            || category_text == "Other"
            || category_text == "Uncategorized"
        {
            detect_category(&format!("{note} {merchant}")).to_string()
        } else {
            category_text.to_string()
        };

        let kind = if kind_text.is_empty() {
            detect_kind(amount, &format!("{note} {merchant}"))
        } else {
            let lower = kind_text.to_lowercase();
            if lower.contains("income") || lower.contains("credit") || lower.contains("deposit") {
                TxKind::Income
            } else {
                TxKind::Expense
            }
        };

        let note = if !note.is_empty() {
            note.to_string()
        } else if !merchant.is_empty() {
            merchant.to_string()
        } else {
            "CSV Import".to_string()
        };

        drafts.push(TransactionDraft {
            amount: amount.abs(),
            category,
            note,
            date,
            kind,
            merchant: (!merchant.is_empty()).then(|| merchant.to_string()),
        });
    }

    CsvParseResult {
        success: !drafts.is_empty(),
        total: rows.len(),
        drafts,
        errors,
        skipped,
    }
}

/// Fixed template offered as a downloadable example.
pub fn sample_csv() -> &'static str {
    "date,amount,category,note,merchant,type\n\
     2025-11-01,45.50,Groceries,Weekly groceries,Walmart,expense\n\
     2025-11-02,12.99,Coffee & Cafe,Morning coffee,Starbucks,expense\n\
     2025-11-03,2700.00,Salary,Monthly salary,,income\n\
     2025-11-05,89.99,Shopping,New headphones,Amazon,expense\n\
     2025-11-07,15.99,Streaming Services,Monthly subscription,Netflix,expense"
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn mapping_for(raw: &str) -> ColumnMapping {
        auto_detect_columns(&csv_headers(raw))
    }

    #[test]
    fn test_parse_csv_rows_basic() {
        let raw = "Date,Amount,Note\n2025-11-01,45.50,groceries\n2025-11-02,12.99,coffee";
        let rows = parse_csv_rows(raw);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["date"], "2025-11-01");
        assert_eq!(rows[1]["note"], "coffee");
    }

    #[test]
    fn test_parse_csv_rows_quoted_commas() {
        let raw = "date,amount,note\n2025-11-01,45.50,\"milk, eggs, bread\"";
        let rows = parse_csv_rows(raw);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["note"], "milk, eggs, bread");
    }

    #[test]
    fn test_parse_csv_rows_drops_ragged_rows() {
        let raw = "date,amount,note\n2025-11-01,45.50\n2025-11-02,12.99,ok";
        let rows = parse_csv_rows(raw);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["note"], "ok");
    }

    #[test]
    fn test_empty_and_header_only_input() {
        assert!(parse_csv_rows("").is_empty());
        assert!(parse_csv_rows("date,amount").is_empty());
        assert!(csv_headers("").is_empty());
    }

    #[test]
    fn test_csv_headers_preserve_casing() {
        let headers = csv_headers("Transaction Date,Amount (USD),Memo\n...");
        assert_eq!(headers, vec!["Transaction Date", "Amount (USD)", "Memo"]);
    }

    #[test]
    fn test_auto_detect_common_bank_headers() {
        let headers: Vec<String> = ["Transaction Date", "Description", "Debit Amount", "Payee"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = auto_detect_columns(&headers);
        assert_eq!(mapping.date, "Transaction Date");
        assert_eq!(mapping.amount, "Debit Amount");
        assert_eq!(mapping.note.as_deref(), Some("Description"));
        assert_eq!(mapping.merchant.as_deref(), Some("Payee"));
        // No exact "type" header, so the kind column stays unmapped
        assert_eq!(mapping.kind, None);
    }

    #[test]
    fn test_auto_detect_missing_required_columns() {
        let headers: Vec<String> = ["Foo", "Bar"].iter().map(|s| s.to_string()).collect();
        let mapping = auto_detect_columns(&headers);
        assert!(mapping.amount.is_empty());
        assert!(mapping.date.is_empty());
    }

    #[test]
    fn test_bad_amount_is_skipped_with_error() {
        let raw = "date,amount\n2025-11-01,abc";
        let result = parse_transactions(&parse_csv_rows(raw), &mapping_for(raw));
        assert!(!result.success);
        assert!(result.drafts.is_empty());
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("Row 2"), "{}", result.errors[0]);
        assert!(result.errors[0].contains("abc"));
    }

    #[test]
    fn test_zero_amount_is_an_error() {
        let raw = "date,amount\n2025-11-01,0.00";
        let result = parse_transactions(&parse_csv_rows(raw), &mapping_for(raw));
        assert_eq!(result.skipped, 1);
        assert!(result.drafts.is_empty());
    }

    #[test]
    fn test_bad_date_is_skipped_with_error() {
        let raw = "date,amount\nnot-a-date,45.50";
        let result = parse_transactions(&parse_csv_rows(raw), &mapping_for(raw));
        assert_eq!(result.skipped, 1);
        assert!(result.errors[0].contains("date"));
    }

    #[test]
    fn test_error_cap_keeps_full_skip_count() {
        let mut raw = String::from("date,amount\n");
        for _ in 0..15 {
            raw.push_str("2025-11-01,abc\n");
        }
        let result = parse_transactions(&parse_csv_rows(&raw), &mapping_for(&raw));
        assert_eq!(result.errors.len(), 10);
        assert_eq!(result.skipped, 15);
        assert_eq!(result.total, 15);
    }

    #[test]
    fn test_category_and_kind_fallbacks() {
        let raw = "date,amount,description\n\
                   2025-11-01,45.50,Starbucks latte\n\
                   2025-11-15,2700.00,Monthly salary deposit";
        let result = parse_transactions(&parse_csv_rows(raw), &mapping_for(raw));
        assert_eq!(result.drafts.len(), 2);
        assert_eq!(result.drafts[0].category, "Coffee & Cafe");
        assert_eq!(result.drafts[0].kind, TxKind::Expense);
        assert_eq!(result.drafts[1].category, "Salary");
        assert_eq!(result.drafts[1].kind, TxKind::Income);
    }

    #[test]
    fn test_placeholder_category_reclassified() {
        let raw = "date,amount,category,note\n\
                   2025-11-01,12.99,Uncategorized,Starbucks latte\n\
                   2025-11-02,45.50,Other,WALMART SUPERCENTER\n\
                   2025-11-03,9.99,Gaming,steam purchase";
        let result = parse_transactions(&parse_csv_rows(raw), &mapping_for(raw));
        assert_eq!(result.drafts.len(), 3);
        // Placeholder cell values fall back to keyword detection on the text
        assert_eq!(result.drafts[0].category, "Coffee & Cafe");
        assert_eq!(result.drafts[1].category, "Groceries");
        // A real label passes through untouched
        assert_eq!(result.drafts[2].category, "Gaming");
    }

    #[test]
    fn test_kind_column_forces_income() {
        let raw = "date,amount,type\n2025-11-01,500.00,Credit";
        let result = parse_transactions(&parse_csv_rows(raw), &mapping_for(raw));
        assert_eq!(result.drafts[0].kind, TxKind::Income);
    }

    #[test]
    fn test_negative_amount_stored_absolute() {
        let raw = "date,amount\n2025-11-01,(12.00)";
        let result = parse_transactions(&parse_csv_rows(raw), &mapping_for(raw));
        assert_eq!(result.drafts[0].amount, 12.0);
        // Sign alone does not flip the kind
        assert_eq!(result.drafts[0].kind, TxKind::Expense);
    }

    #[test]
    fn test_note_defaults() {
        let raw = "date,amount,merchant\n2025-11-01,45.50,Walmart\n2025-11-02,9.99,";
        let result = parse_transactions(&parse_csv_rows(raw), &mapping_for(raw));
        assert_eq!(result.drafts[0].note, "Walmart");
        assert_eq!(result.drafts[1].note, "CSV Import");
        assert_eq!(result.drafts[1].merchant, None);
    }

    #[test]
    fn test_sample_csv_round_trip() {
        let raw = sample_csv();
        let headers = csv_headers(raw);
        assert_eq!(headers[0], "date");
        let mapping = auto_detect_columns(&headers);
        let result = parse_transactions(&parse_csv_rows(raw), &mapping);

        assert!(result.success);
        assert_eq!(result.drafts.len(), 5);
        assert!(result.errors.is_empty());
        assert_eq!(result.skipped, 0);

        let salary = &result.drafts[2];
        assert_eq!(salary.kind, TxKind::Income);
        assert_eq!(salary.amount, 2700.0);
        assert_eq!(salary.date, NaiveDate::from_ymd_opt(2025, 11, 3).unwrap());

        let netflix = &result.drafts[4];
        assert_eq!(netflix.merchant.as_deref(), Some("Netflix"));
        assert_eq!(netflix.category, "Streaming Services");
    }
}
