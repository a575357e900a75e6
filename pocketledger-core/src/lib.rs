//! pocketledger-core: transaction record types and the keyword-driven
//! category classifier shared by the ingest and insights crates.

pub mod categories;
pub mod transaction;

pub use categories::{detect_category, detect_kind, EXPENSE_CATEGORIES, INCOME_CATEGORIES};
pub use transaction::{Transaction, TransactionDraft, TxKind};
