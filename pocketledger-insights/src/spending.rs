//! Rule-based spending insights: short observations about week-over-week
//! change, dominant categories, income ratio, month-over-month trend, and
//! frequent merchants.

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use pocketledger_core::Transaction;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InsightKind {
    #[serde(rename = "spending")]
    Spending,
    #[serde(rename = "category")]
    Category,
    #[serde(rename = "budget")]
    Budget,
    #[serde(rename = "trend")]
    Trend,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "success")]
    Success,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    pub id: String,
    pub kind: InsightKind,
    pub message: String,
    pub severity: Severity,
}

/// Thresholds below which a change is too small to be worth surfacing.
const WEEKLY_CHANGE_PCT: f64 = 10.0;
const MONTHLY_TREND_PCT: f64 = 15.0;

pub fn generate_insights(transactions: &[Transaction]) -> Vec<Insight> {
    generate_insights_as_of(transactions, Local::now().date_naive())
}

pub fn generate_insights_as_of(transactions: &[Transaction], today: NaiveDate) -> Vec<Insight> {
    let mut insights = Vec::new();
    let month_start = month_start(today);
    let week_ago = today.checked_sub_days(Days::new(7)).unwrap_or(today);
    let two_weeks_ago = today.checked_sub_days(Days::new(14)).unwrap_or(today);
    let last_month_start = month_start
        .checked_sub_days(Days::new(1))
        .map(self::month_start)
        .unwrap_or(month_start);

    let this_month: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.date.year() == today.year() && t.date.month() == today.month())
        .collect();

    let expense_sum = |txns: &[&Transaction]| -> f64 {
        txns.iter().filter(|t| t.is_expense()).map(|t| t.amount).sum()
    };

    let push = |insights: &mut Vec<Insight>, kind, message: String, severity| {
        let id = format!("insight-{}", insights.len() + 1);
        insights.push(Insight {
            id,
            kind,
            message,
            severity,
        });
    };

    // Week-over-week spending change
    let this_week: Vec<&Transaction> =
        transactions.iter().filter(|t| t.date >= week_ago).collect();
    let previous_week: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.date >= two_weeks_ago && t.date < week_ago)
        .collect();
    let this_week_spend = expense_sum(&this_week);
    let previous_week_spend = expense_sum(&previous_week);

    if previous_week_spend > 0.0 {
        let change = (this_week_spend - previous_week_spend) / previous_week_spend * 100.0;
        if change.abs() > WEEKLY_CHANGE_PCT {
            let (message, severity) = if change > 0.0 {
                (
                    format!(
                        "You spent {change:.0}% more than last week. Consider reviewing your recent purchases."
                    ),
                    Severity::Warning,
                )
            } else {
                (
                    format!(
                        "Great job! You spent {:.0}% less than last week.",
                        change.abs()
                    ),
                    Severity::Success,
                )
            };
            push(&mut insights, InsightKind::Spending, message, severity);
        }
    }

    // Biggest expense category this month
    let mut category_totals: HashMap<&str, f64> = HashMap::new();
    for t in this_month.iter().filter(|t| t.is_expense()) {
        *category_totals.entry(t.category.as_str()).or_insert(0.0) += t.amount;
    }
    let top_category = category_totals
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal));
    if let Some((category, total)) = top_category {
        if *total > 0.0 {
            push(
                &mut insights,
                InsightKind::Category,
                format!(
                    "Your biggest expense category this month is {category} (${total:.2})."
                ),
                Severity::Info,
            );
        }
    }

    // Spending as a share of this month's income
    let month_expenses = expense_sum(&this_month);
    let month_income: f64 = this_month
        .iter()
        .filter(|t| t.is_income())
        .map(|t| t.amount)
        .sum();
    if month_income > 0.0 {
        let ratio = month_expenses / month_income * 100.0;
        if ratio > 80.0 {
            push(
                &mut insights,
                InsightKind::Budget,
                format!(
                    "You're spending {ratio:.0}% of your income this month. Consider reducing expenses to build savings."
                ),
                Severity::Warning,
            );
        } else if ratio < 50.0 {
            push(
                &mut insights,
                InsightKind::Budget,
                format!(
                    "Excellent! You're only spending {ratio:.0}% of your income. Great savings potential!"
                ),
                Severity::Success,
            );
        }
    }

    // Month-over-month trend
    let last_month: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.date >= last_month_start && t.date < month_start)
        .collect();
    let last_month_expenses = expense_sum(&last_month);
    if last_month_expenses > 0.0 {
        let trend = (month_expenses - last_month_expenses) / last_month_expenses * 100.0;
        if trend.abs() > MONTHLY_TREND_PCT {
            let (message, severity) = if trend > 0.0 {
                (
                    format!("Your spending increased by {trend:.0}% compared to last month."),
                    Severity::Warning,
                )
            } else {
                (
                    format!(
                        "Your spending decreased by {:.0}% compared to last month. Keep it up!",
                        trend.abs()
                    ),
                    Severity::Success,
                )
            };
            push(&mut insights, InsightKind::Trend, message, severity);
        }
    }

    // Frequent merchant: a likely subscription the user hasn't flagged
    let mut merchant_counts: HashMap<&str, usize> = HashMap::new();
    for t in this_month.iter().filter(|t| t.is_expense()) {
        if let Some(merchant) = t.merchant.as_deref() {
            *merchant_counts.entry(merchant).or_insert(0) += 1;
        }
    }
    let frequent = merchant_counts
        .iter()
        .filter(|(_, count)| **count >= 3)
        .max_by_key(|(_, count)| **count);
    if let Some((merchant, count)) = frequent {
        push(
            &mut insights,
            InsightKind::Spending,
            format!(
                "You've made {count} purchases at {merchant} this month. This might be a subscription or recurring expense."
            ),
            Severity::Info,
        );
    }

    insights
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
