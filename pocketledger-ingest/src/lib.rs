//! pocketledger-ingest: CSV statement ingestion — amount/date normalizers,
//! tabular parsing, column auto-detection, and draft transaction extraction.

pub mod csv_import;
pub mod normalize;

pub use csv_import::{
    auto_detect_columns, csv_headers, parse_csv_rows, parse_transactions, sample_csv,
    ColumnMapping, CsvParseResult, CsvRow,
};
pub use normalize::{parse_amount, parse_date};
