//! End-of-month balance forecast.
//!
//! A recurrence pass over the trailing six months splits spending into
//! recurring and variable, the variable side becomes a daily rate, and both
//! are projected through the end of the current calendar month.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use pocketledger_core::{Transaction, TxKind};

use crate::round_cents;

/// Cadences recognized by the forecast's own recurrence pass. Finer-grained
/// than the subscription radar, which only ever reports monthly or yearly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecurrenceFrequency {
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "biweekly")]
    Biweekly,
    #[serde(rename = "monthly")]
    Monthly,
}

/// A recurring pattern found in the historical window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTransaction {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    pub average_amount: f64,
    pub frequency: RecurrenceFrequency,
    pub occurrences: usize,
    #[serde(rename = "type")]
    pub kind: TxKind,
}

/// Qualitative reliability of a forecast, from sample size and how many
/// recurring expense patterns anchored it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ForecastConfidence {
    #[serde(rename = "high")]
    High,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "low")]
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub current_balance: f64,
    pub projected_eom_balance: f64,
    pub projected_income: f64,
    pub projected_expenses: f64,
    pub recurring_expenses: Vec<RecurringTransaction>,
    pub recurring_income: Vec<RecurringTransaction>,
    pub average_daily_spending: f64,
    pub remaining_days: i64,
    pub projected_variable_spending: f64,
    pub confidence: ForecastConfidence,
    pub insights: Vec<String>,
}

/// Recurrence identity for the forecast pass: direction, category, merchant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RecurrenceKey {
    kind: TxKind,
    category: String,
    merchant: Option<String>,
}

const CONSISTENCY_THRESHOLD: f64 = 0.2;
const HISTORY_MONTHS: u32 = 6;

/// Forecast the end-of-month balance relative to the current date.
pub fn forecast_end_of_month(
    transactions: &[Transaction],
    current_balance: Option<f64>,
) -> ForecastResult {
    forecast_end_of_month_as_of(transactions, current_balance, Local::now().date_naive())
}

/// Forecast with an explicit "today" so projections are reproducible.
pub fn forecast_end_of_month_as_of(
    transactions: &[Transaction],
    current_balance: Option<f64>,
    today: NaiveDate,
) -> ForecastResult {
    let month_end = end_of_month(today);
    let remaining_days = (month_end - today).num_days();
    let window_start = today
        .checked_sub_months(Months::new(HISTORY_MONTHS))
        .unwrap_or(today);

    // Strictly-before-today keeps today's still-incomplete activity out of
    // the historical sample
    let historical: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.date > window_start && t.date < today)
        .collect();

    let current_month: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| {
            t.date.year() == today.year() && t.date.month() == today.month() && t.date < today
        })
        .collect();

    let current_balance =
        current_balance.unwrap_or_else(|| transactions.iter().map(|t| t.signed_amount()).sum());

    let (recurring_expenses, recurring_income) = identify_recurring(&historical);

    let average_daily_spending = average_daily_variable_spend(&historical, &recurring_expenses);

    let projected_recurring_expenses =
        project_to_month_end(&recurring_expenses, &current_month, remaining_days);
    let projected_recurring_income =
        project_to_month_end(&recurring_income, &current_month, remaining_days);
    let projected_variable_spending = average_daily_spending * remaining_days as f64;

    let projected_expenses = projected_recurring_expenses + projected_variable_spending;
    let projected_income = projected_recurring_income;
    let projected_eom_balance = current_balance + projected_income - projected_expenses;

    let confidence = confidence_for(historical.len(), recurring_expenses.len());

    let insights = forecast_insights(
        projected_eom_balance,
        current_balance,
        average_daily_spending,
        &recurring_expenses,
        projected_variable_spending,
        remaining_days,
    );

    ForecastResult {
        current_balance,
        projected_eom_balance: round_cents(projected_eom_balance),
        projected_income: round_cents(projected_income),
        projected_expenses: round_cents(projected_expenses),
        recurring_expenses,
        recurring_income,
        average_daily_spending: round_cents(average_daily_spending),
        remaining_days,
        projected_variable_spending: round_cents(projected_variable_spending),
        confidence,
        insights,
    }
}

/// Last calendar day of the month containing `date`.
fn end_of_month(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Split the historical sample into recurring expense and income patterns:
/// at least two occurrences, amounts within 20% of their mean, cadence from
/// the mean day-gap.
fn identify_recurring(
    historical: &[&Transaction],
) -> (Vec<RecurringTransaction>, Vec<RecurringTransaction>) {
    let mut groups: BTreeMap<RecurrenceKey, Vec<&Transaction>> = BTreeMap::new();
    for t in historical {
        let key = RecurrenceKey {
            kind: t.kind,
            category: t.category.clone(),
            merchant: t.merchant.clone(),
        };
        groups.entry(key).or_default().push(t);
    }

    let mut expenses = Vec::new();
    let mut income = Vec::new();

    for (key, mut members) in groups {
        if members.len() < 2 {
            continue;
        }

        let amounts: Vec<f64> = members.iter().map(|t| t.amount).collect();
        let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;
        // A zero mean makes the relative test NaN, which correctly fails it
        let consistent = amounts
            .iter()
            .all(|a| (a - mean).abs() / mean < CONSISTENCY_THRESHOLD);
        if !consistent {
            continue;
        }

        members.sort_by_key(|t| t.date);
        let gaps: Vec<f64> = members
            .windows(2)
            .map(|pair| (pair[1].date - pair[0].date).num_days() as f64)
            .collect();
        if gaps.is_empty() {
            continue;
        }
        let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;

        let frequency = if mean_gap <= 10.0 {
            RecurrenceFrequency::Weekly
        } else if mean_gap <= 20.0 {
            RecurrenceFrequency::Biweekly
        } else {
            RecurrenceFrequency::Monthly
        };

        let recurring = RecurringTransaction {
            category: key.category,
            merchant: key.merchant,
            average_amount: round_cents(mean),
            frequency,
            occurrences: members.len(),
            kind: key.kind,
        };

        match recurring.kind {
            TxKind::Expense => expenses.push(recurring),
            TxKind::Income => income.push(recurring),
        }
    }

    (expenses, income)
}

/// Daily rate of spending not attributed to any recurring expense pattern:
/// total variable spend over the span of the variable sample, minimum one
/// day.
fn average_daily_variable_spend(
    historical: &[&Transaction],
    recurring_expenses: &[RecurringTransaction],
) -> f64 {
    let recurring_keys: HashSet<(&str, Option<&str>)> = recurring_expenses
        .iter()
        .map(|r| (r.category.as_str(), r.merchant.as_deref()))
        .collect();

    let variable: Vec<&&Transaction> = historical
        .iter()
        .filter(|t| {
            t.is_expense() && !recurring_keys.contains(&(t.category.as_str(), t.merchant.as_deref()))
        })
        .collect();

    if variable.is_empty() {
        return 0.0;
    }

    let total: f64 = variable.iter().map(|t| t.amount).sum();
    let min_date = variable.iter().map(|t| t.date).min();
    let max_date = variable.iter().map(|t| t.date).max();
    let span_days = match (min_date, max_date) {
        (Some(min), Some(max)) => (max - min).num_days().max(1),
        _ => 1,
    };

    total / span_days as f64
}

/// Project recurring patterns through month end. A monthly pattern counts
/// once more unless it already recurred this calendar month; weekly and
/// biweekly patterns count per remaining full period.
fn project_to_month_end(
    recurring: &[RecurringTransaction],
    current_month: &[&Transaction],
    remaining_days: i64,
) -> f64 {
    let mut total = 0.0;

    for r in recurring {
        let already_occurred = current_month.iter().any(|t| {
            t.category == r.category
                && r.merchant
                    .as_ref()
                    .is_none_or(|m| t.merchant.as_deref() == Some(m.as_str()))
        });

        match r.frequency {
            RecurrenceFrequency::Monthly => {
                if !already_occurred {
                    total += r.average_amount;
                }
            }
            RecurrenceFrequency::Weekly => {
                total += r.average_amount * (remaining_days / 7) as f64;
            }
            RecurrenceFrequency::Biweekly => {
                total += r.average_amount * (remaining_days / 14) as f64;
            }
        }
    }

    total
}

fn confidence_for(sample_size: usize, recurring_expense_count: usize) -> ForecastConfidence {
    if sample_size >= 50 && recurring_expense_count >= 3 {
        ForecastConfidence::High
    } else if sample_size >= 20 && recurring_expense_count >= 1 {
        ForecastConfidence::Medium
    } else {
        ForecastConfidence::Low
    }
}

fn forecast_insights(
    projected_eom_balance: f64,
    current_balance: f64,
    average_daily_spending: f64,
    recurring_expenses: &[RecurringTransaction],
    projected_variable_spending: f64,
    remaining_days: i64,
) -> Vec<String> {
    let mut insights = Vec::new();

    if projected_eom_balance < 0.0 {
        insights.push(format!(
            "Warning: projected to end the month with a negative balance of ${:.2}",
            projected_eom_balance.abs()
        ));
    } else if projected_eom_balance < current_balance * 0.2 {
        insights.push("Balance expected to decrease significantly by end of month".to_string());
    } else {
        insights.push(format!(
            "On track to end the month with ${projected_eom_balance:.2}"
        ));
    }

    insights.push(format!(
        "Your average daily spending is ${average_daily_spending:.2}"
    ));

    if remaining_days > 0 {
        insights.push(format!("{remaining_days} days remaining this month"));
    }

    if projected_variable_spending > 0.0 {
        insights.push(format!(
            "Estimated variable spending: ${projected_variable_spending:.2}"
        ));
    }

    if !recurring_expenses.is_empty() {
        let mut by_amount: Vec<&RecurringTransaction> = recurring_expenses.iter().collect();
        by_amount.sort_by(|a, b| {
            b.average_amount
                .partial_cmp(&a.average_amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let top_total: f64 = by_amount.iter().take(3).map(|r| r.average_amount).sum();
        insights.push(format!(
            "{} recurring expenses detected (~${top_total:.2}/month)",
            recurring_expenses.len()
        ));
    }

    insights
}
