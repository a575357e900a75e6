//! Ledger entry types. Persisted as camelCase JSON so stored records match
//! the shape the web app wrote to local storage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a transaction. Amounts are stored non-negative; this carries
/// the sign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TxKind {
    #[serde(rename = "expense")]
    Expense,
    #[serde(rename = "income")]
    Income,
}

/// A single recorded transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Opaque unique identifier assigned by the store
    pub id: String,
    /// Non-negative, currency-normalized amount
    pub amount: f64,
    /// One label from the closed category set
    pub category: String,
    /// Free text, may be empty
    pub note: String,
    /// Calendar date, no time component
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TxKind,
    /// Optional counterparty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    /// User-asserted recurring-payment flag
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_subscription: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_start_date: Option<NaiveDate>,
    /// An end date in the past marks the asserted subscription cancelled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<NaiveDate>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TxKind::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TxKind::Income
    }

    /// Amount with direction applied: income positive, expense negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TxKind::Income => self.amount,
            TxKind::Expense => -self.amount,
        }
    }
}

/// A transaction produced by an import path (CSV, receipt scan) before the
/// store has assigned it an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub amount: f64,
    pub category: String,
    pub note: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TxKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
}

impl TransactionDraft {
    /// Promote to a full Transaction once the store picks an id.
    pub fn into_transaction(self, id: impl Into<String>) -> Transaction {
        Transaction {
            id: id.into(),
            amount: self.amount,
            category: self.category,
            note: self.note,
            date: self.date,
            kind: self.kind,
            merchant: self.merchant,
            is_subscription: false,
            subscription_start_date: None,
            subscription_end_date: None,
        }
    }
}
