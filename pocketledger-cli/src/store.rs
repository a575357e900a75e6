//! JSON file store under ~/.pocketledger, the CLI's stand-in for the web
//! app's local-storage persistence. Owns durability and id assignment; the
//! analytical crates only ever see the in-memory snapshot.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use pocketledger_core::{Transaction, TransactionDraft};

pub fn ledger_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".pocketledger"))
}

pub fn ensure_ledger_home() -> Result<PathBuf> {
    let dir = ledger_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn transactions_path() -> Result<PathBuf> {
    Ok(ensure_ledger_home()?.join("transactions.json"))
}

pub fn load_transactions() -> Result<Vec<Transaction>> {
    let path = transactions_path()?;
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

pub fn save_transactions(transactions: &[Transaction]) -> Result<()> {
    let path = transactions_path()?;
    let json = serde_json::to_string_pretty(transactions)?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Merge imported drafts into the ledger, assigning sequential ids past the
/// highest already in use. Returns the ids given out.
pub fn merge_drafts(
    transactions: &mut Vec<Transaction>,
    drafts: Vec<TransactionDraft>,
) -> Vec<String> {
    let mut next = transactions
        .iter()
        .filter_map(|t| t.id.strip_prefix("txn-")?.parse::<u64>().ok())
        .max()
        .map(|n| n + 1)
        .unwrap_or(0);

    let mut assigned = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let id = format!("txn-{next:04}");
        next += 1;
        transactions.push(draft.into_transaction(&id));
        assigned.push(id);
    }
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pocketledger_core::TxKind;

    fn draft(amount: f64) -> TransactionDraft {
        TransactionDraft {
            amount,
            category: "Groceries".to_string(),
            note: "test".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            kind: TxKind::Expense,
            merchant: None,
        }
    }

    #[test]
    fn test_merge_assigns_sequential_ids() {
        let mut ledger = Vec::new();
        let ids = merge_drafts(&mut ledger, vec![draft(1.0), draft(2.0)]);
        assert_eq!(ids, vec!["txn-0000", "txn-0001"]);

        // A second import continues past the highest existing id
        let ids = merge_drafts(&mut ledger, vec![draft(3.0)]);
        assert_eq!(ids, vec!["txn-0002"]);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_merge_skips_foreign_ids() {
        let mut ledger = vec![draft(1.0).into_transaction("manual-abc")];
        let ids = merge_drafts(&mut ledger, vec![draft(2.0)]);
        assert_eq!(ids, vec!["txn-0000"]);
    }
}
