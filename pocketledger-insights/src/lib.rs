//! pocketledger-insights: the analytical passes recomputed on every data
//! change — subscription radar, end-of-month forecast, and rule-based
//! spending insights. Pure projections over a transaction snapshot; nothing
//! here holds state or mutates its input.

pub mod forecast;
pub mod spending;
pub mod subscriptions;

pub use forecast::{
    forecast_end_of_month, forecast_end_of_month_as_of, ForecastConfidence, ForecastResult,
    RecurrenceFrequency, RecurringTransaction,
};
pub use spending::{generate_insights, generate_insights_as_of, Insight, InsightKind, Severity};
pub use subscriptions::{
    detect_subscriptions, detect_subscriptions_as_of, BillingFrequency, Subscription,
};

/// Round to cents for anything user-facing.
pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
