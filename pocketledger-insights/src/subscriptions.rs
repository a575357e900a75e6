//! Subscription radar: infer recurring payments from transaction patterns.
//!
//! Groups expenses by (merchant, category), checks amount consistency and
//! date-interval regularity, and emits one Subscription per qualifying
//! group. User-asserted subscription flags lower the evidence bar; an
//! asserted subscription whose end date has passed is treated as cancelled
//! but its history still feeds pattern mining.

use std::collections::{BTreeMap, HashSet};

use chrono::{Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use pocketledger_core::Transaction;

use crate::round_cents;

/// Billing cadences the radar emits. Intervals that look weekly-ish are
/// either rejected or, when user-asserted, leniently called monthly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BillingFrequency {
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "yearly")]
    Yearly,
}

/// A detected recurring payment. Recomputed in full on every run — the id is
/// derived from the grouping key, and the caller diffs against previous
/// results if it wants UI stability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    /// Merchant when known, else the category label
    pub name: String,
    /// Mean amount across contributing transactions, rounded to cents
    pub amount: f64,
    pub category: String,
    pub frequency: BillingFrequency,
    pub next_billing_date: NaiveDate,
    /// Ids of the contributing transactions, earliest first
    pub detected_from: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<NaiveDate>,
}

/// Composite grouping identity. A struct key rather than a concatenated
/// string, so merchant names containing the old separator can't collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    merchant: Option<String>,
    category: String,
}

const ASSERTED_VARIANCE: f64 = 0.25;
const PATTERN_VARIANCE: f64 = 0.15;
/// Below this mean the relative-deviation test is meaningless; require
/// exact equality instead.
const NEGLIGIBLE_MEAN: f64 = 0.01;

/// Detect subscriptions relative to the current date.
pub fn detect_subscriptions(transactions: &[Transaction]) -> Vec<Subscription> {
    detect_subscriptions_as_of(transactions, Local::now().date_naive())
}

/// Detection pass with an explicit "today", so cancellation cutoffs and next
/// billing dates are reproducible.
pub fn detect_subscriptions_as_of(
    transactions: &[Transaction],
    today: NaiveDate,
) -> Vec<Subscription> {
    let cancelled =
        |t: &Transaction| matches!(t.subscription_end_date, Some(end) if end < today);
    let asserted_active = |t: &Transaction| t.is_subscription && !cancelled(t);

    // Every expense participates: asserted-active ones lower the group's
    // evidence bar, cancelled ones are kept for historical pattern mining.
    let mut groups: BTreeMap<GroupKey, Vec<&Transaction>> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.is_expense()) {
        let key = GroupKey {
            merchant: t.merchant.clone(),
            category: t.category.clone(),
        };
        groups.entry(key).or_default().push(t);
    }

    let mut subscriptions = Vec::new();

    for (key, mut members) in groups {
        let has_asserted = members.iter().any(|t| asserted_active(t));

        // Asserted groups qualify from a single payment; inferred ones need
        // at least two
        if !has_asserted && members.len() < 2 {
            continue;
        }

        members.sort_by_key(|t| t.date);

        let amounts: Vec<f64> = members.iter().map(|t| t.amount).collect();
        let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;

        // Amount-consistency check; a lone asserted payment skips it
        if amounts.len() > 1 {
            let threshold = if has_asserted {
                ASSERTED_VARIANCE
            } else {
                PATTERN_VARIANCE
            };
            let consistent = if mean > NEGLIGIBLE_MEAN {
                amounts.iter().all(|a| (a - mean).abs() / mean < threshold)
            } else {
                amounts.iter().all(|a| *a == amounts[0])
            };
            if !consistent {
                continue;
            }
        }

        let gaps: Vec<f64> = members
            .windows(2)
            .map(|pair| (pair[1].date - pair[0].date).num_days() as f64)
            .collect();

        let frequency = if gaps.is_empty() {
            // Single payment (or same-day duplicates): only an asserted
            // subscription qualifies, assumed monthly
            if !has_asserted {
                continue;
            }
            BillingFrequency::Monthly
        } else {
            let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
            if (25.0..=35.0).contains(&mean_gap) {
                BillingFrequency::Monthly
            } else if (350.0..=380.0).contains(&mean_gap) {
                BillingFrequency::Yearly
            } else if (20.0..25.0).contains(&mean_gap) || (35.0..45.0).contains(&mean_gap) {
                // Tolerance bands around monthly
                BillingFrequency::Monthly
            } else if mean_gap < 20.0 {
                // Too frequent for a subscription unless the user says so
                if !has_asserted {
                    continue;
                }
                BillingFrequency::Monthly
            } else {
                // Everything else leans monthly; the classifier is
                // deliberately biased that way
                BillingFrequency::Monthly
            }
        };

        let last_date = members[members.len() - 1].date;
        let next_billing_date = match frequency {
            BillingFrequency::Monthly => last_date.checked_add_months(Months::new(1)),
            BillingFrequency::Yearly => last_date.checked_add_months(Months::new(12)),
        }
        .unwrap_or(last_date);

        let earliest = members[0];
        let name = key.merchant.clone().unwrap_or_else(|| key.category.clone());

        subscriptions.push(Subscription {
            id: subscription_id(&key),
            name,
            amount: round_cents(mean),
            category: key.category.clone(),
            frequency,
            next_billing_date,
            detected_from: members.iter().map(|t| t.id.clone()).collect(),
            subscription_start_date: earliest.subscription_start_date.or(Some(earliest.date)),
            subscription_end_date: earliest.subscription_end_date,
        });
    }

    // Same name+category collapses to the first entry; amount is left out of
    // the identity so slightly different means don't duplicate
    let mut seen: HashSet<(String, String)> = HashSet::new();
    subscriptions.retain(|s| seen.insert((s.name.clone(), s.category.clone())));

    subscriptions
}

fn subscription_id(key: &GroupKey) -> String {
    match &key.merchant {
        Some(merchant) => format!("sub-{}-{}", slug(merchant), slug(&key.category)),
        None => format!("sub-{}", slug(&key.category)),
    }
}

fn slug(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketledger_core::TxKind;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 15).unwrap()
    }

    fn expense(id: &str, merchant: Option<&str>, category: &str, amount: f64, date: NaiveDate) -> Transaction {
        Transaction {
            id: id.to_string(),
            amount,
            category: category.to_string(),
            note: String::new(),
            date,
            kind: TxKind::Expense,
            merchant: merchant.map(|m| m.to_string()),
            is_subscription: false,
            subscription_start_date: None,
            subscription_end_date: None,
        }
    }

    fn monthly_netflix() -> Vec<Transaction> {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        vec![
            expense("t1", Some("Netflix"), "Entertainment", 9.99, d(2025, 8, 10)),
            expense("t2", Some("Netflix"), "Entertainment", 9.99, d(2025, 9, 9)),
            expense("t3", Some("Netflix"), "Entertainment", 9.99, d(2025, 10, 9)),
        ]
    }

    #[test]
    fn test_monthly_pattern_detected() {
        let subs = detect_subscriptions_as_of(&monthly_netflix(), today());
        assert_eq!(subs.len(), 1);
        let sub = &subs[0];
        assert_eq!(sub.name, "Netflix");
        assert_eq!(sub.amount, 9.99);
        assert_eq!(sub.frequency, BillingFrequency::Monthly);
        assert_eq!(
            sub.next_billing_date,
            NaiveDate::from_ymd_opt(2025, 11, 9).unwrap()
        );
        assert_eq!(sub.detected_from, vec!["t1", "t2", "t3"]);
        // Start falls back to the earliest contributing date
        assert_eq!(
            sub.subscription_start_date,
            NaiveDate::from_ymd_opt(2025, 8, 10)
        );
    }

    #[test]
    fn test_detection_is_idempotent() {
        let txns = monthly_netflix();
        let first = detect_subscriptions_as_of(&txns, today());
        let second = detect_subscriptions_as_of(&txns, today());
        let tuple = |s: &Subscription| (s.name.clone(), s.category.clone(), s.amount, s.frequency);
        assert_eq!(
            first.iter().map(tuple).collect::<Vec<_>>(),
            second.iter().map(tuple).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_single_transaction_needs_assertion() {
        let d = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let plain = vec![expense("t1", Some("Spotify"), "Streaming Services", 4.99, d)];
        assert!(detect_subscriptions_as_of(&plain, today()).is_empty());

        let mut asserted = plain.clone();
        asserted[0].is_subscription = true;
        let subs = detect_subscriptions_as_of(&asserted, today());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].frequency, BillingFrequency::Monthly);
        assert_eq!(subs[0].amount, 4.99);
    }

    #[test]
    fn test_cancelled_assertion_yields_nothing() {
        let d = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let mut txns = vec![expense("t1", Some("Spotify"), "Streaming Services", 4.99, d)];
        txns[0].is_subscription = true;
        txns[0].subscription_end_date = today().pred_opt();
        assert!(detect_subscriptions_as_of(&txns, today()).is_empty());
    }

    #[test]
    fn test_inconsistent_amounts_rejected() {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let txns = vec![
            expense("t1", Some("Corner Shop"), "Groceries", 10.0, d(8, 1)),
            expense("t2", Some("Corner Shop"), "Groceries", 20.0, d(9, 1)),
            expense("t3", Some("Corner Shop"), "Groceries", 35.0, d(10, 1)),
        ];
        assert!(detect_subscriptions_as_of(&txns, today()).is_empty());
    }

    #[test]
    fn test_negligible_mean_requires_exact_amounts() {
        let d = |m| NaiveDate::from_ymd_opt(2025, m, 1).unwrap();
        let equal = vec![
            expense("t1", Some("Micro"), "Other", 0.005, d(9)),
            expense("t2", Some("Micro"), "Other", 0.005, d(10)),
        ];
        let subs = detect_subscriptions_as_of(&equal, today());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].frequency, BillingFrequency::Monthly);

        // Below a cent the relative-deviation test is meaningless, so any
        // difference rejects the group
        let unequal = vec![
            expense("t1", Some("Micro"), "Other", 0.005, d(9)),
            expense("t2", Some("Micro"), "Other", 0.008, d(10)),
        ];
        assert!(detect_subscriptions_as_of(&unequal, today()).is_empty());
    }

    #[test]
    fn test_asserted_group_uses_looser_variance() {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        // 20% off the mean: fails the 15% pattern bar, passes the 25%
        // asserted bar
        let mut txns = vec![
            expense("t1", Some("Gym"), "Fitness", 40.0, d(8, 1)),
            expense("t2", Some("Gym"), "Fitness", 60.0, d(9, 1)),
        ];
        assert!(detect_subscriptions_as_of(&txns, today()).is_empty());

        txns[0].is_subscription = true;
        let subs = detect_subscriptions_as_of(&txns, today());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].amount, 50.0);
    }

    #[test]
    fn test_yearly_interval() {
        let txns = vec![
            expense("t1", Some("Prime"), "Subscriptions", 139.0, NaiveDate::from_ymd_opt(2023, 10, 1).unwrap()),
            expense("t2", Some("Prime"), "Subscriptions", 139.0, NaiveDate::from_ymd_opt(2024, 9, 30).unwrap()),
        ];
        let subs = detect_subscriptions_as_of(&txns, today());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].frequency, BillingFrequency::Yearly);
        assert_eq!(
            subs[0].next_billing_date,
            NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()
        );
    }

    #[test]
    fn test_weekly_cadence_rejected_unless_asserted() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 10, day).unwrap();
        let mut txns = vec![
            expense("t1", Some("Cleaner"), "Home & Garden", 80.0, d(1)),
            expense("t2", Some("Cleaner"), "Home & Garden", 80.0, d(8)),
            expense("t3", Some("Cleaner"), "Home & Garden", 80.0, d(15)),
        ];
        assert!(detect_subscriptions_as_of(&txns, today()).is_empty());

        for t in &mut txns {
            t.is_subscription = true;
        }
        let subs = detect_subscriptions_as_of(&txns, today());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].frequency, BillingFrequency::Monthly);
    }

    #[test]
    fn test_merchantless_group_named_by_category() {
        let d = |m| NaiveDate::from_ymd_opt(2025, m, 1).unwrap();
        let txns = vec![
            expense("t1", None, "Internet", 59.99, d(8)),
            expense("t2", None, "Internet", 59.99, d(9)),
            expense("t3", None, "Internet", 59.99, d(10)),
        ];
        let subs = detect_subscriptions_as_of(&txns, today());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].name, "Internet");
        assert_eq!(subs[0].id, "sub-internet");
    }

    #[test]
    fn test_same_name_and_category_collapses_to_first_group() {
        let d = |m| NaiveDate::from_ymd_opt(2025, m, 1).unwrap();
        // A merchantless group is named by its category; a merchant sharing
        // that name would otherwise show up twice
        let txns = vec![
            expense("t1", None, "Internet", 59.99, d(8)),
            expense("t2", None, "Internet", 59.99, d(9)),
            expense("t3", Some("Internet"), "Internet", 59.99, d(8)),
            expense("t4", Some("Internet"), "Internet", 59.99, d(9)),
        ];
        let subs = detect_subscriptions_as_of(&txns, today());
        assert_eq!(subs.len(), 1);
        // Merchantless keys sort first, so that group wins the dedup
        assert_eq!(subs[0].id, "sub-internet");
        assert_eq!(subs[0].detected_from, vec!["t1", "t2"]);
    }

    #[test]
    fn test_income_never_considered() {
        let d = |m| NaiveDate::from_ymd_opt(2025, m, 1).unwrap();
        let mut txns = vec![
            expense("t1", Some("Acme Corp"), "Salary", 2700.0, d(8)),
            expense("t2", Some("Acme Corp"), "Salary", 2700.0, d(9)),
        ];
        for t in &mut txns {
            t.kind = TxKind::Income;
        }
        assert!(detect_subscriptions_as_of(&txns, today()).is_empty());
    }

    #[test]
    fn test_never_mutates_input() {
        let txns = monthly_netflix();
        let before = txns.clone();
        let _ = detect_subscriptions_as_of(&txns, today());
        assert_eq!(txns, before);
    }
}
