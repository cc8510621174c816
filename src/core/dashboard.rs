//! Monthly spend dashboard.
//!
//! Observations are split by `date_recorded` into the current calendar month
//! and the one before it, using the local clock. Current-month spend is also
//! bucketed by category, with the product's explicit category taking
//! precedence over keyword inference.

use crate::{
    config::database::Store,
    core::{category::CategoryRules, ledger, money::round_currency, product},
    entities::{price_observation, product as product_entity},
    errors::Result,
};
use chrono::{Datelike, Duration, Local, NaiveDate};
use std::collections::HashMap;
use tracing::instrument;

/// Spend in one category this month.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpend {
    /// Category label
    pub category: String,
    /// Sum of prices, rounded to cents
    pub total: f64,
    /// Number of observations in the category
    pub observations: usize,
}

/// Current vs. previous month totals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardSummary {
    /// Spend since the first day of this month
    pub current_month_total: f64,
    /// Spend in the previous calendar month
    pub previous_month_total: f64,
    /// Percent change vs. the previous month; `None` when it had no spend
    pub month_over_month_change: Option<f64>,
    /// Current-month spend by category, largest first
    pub categories: Vec<CategorySpend>,
    /// Observations counted in the current month
    pub current_month_observations: usize,
    /// Observations counted in the previous month
    pub previous_month_observations: usize,
}

/// First day of the month containing `date`.
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// First day of the month before the one containing `date`.
#[must_use]
pub fn previous_month_start(date: NaiveDate) -> NaiveDate {
    month_start(month_start(date) - Duration::days(1))
}

/// First day of the month after the one containing `date`.
#[must_use]
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    month_start(month_start(date) + Duration::days(31))
}

/// Builds the summary for the month containing `today`.
#[must_use]
pub fn summarize(
    observations: &[price_observation::Model],
    products: &HashMap<i64, product_entity::Model>,
    rules: &CategoryRules,
    today: NaiveDate,
) -> DashboardSummary {
    let current_start = month_start(today);
    let current_end = next_month_start(today);
    let previous_start = previous_month_start(today);

    let mut summary = DashboardSummary::default();
    let mut by_category: HashMap<String, (f64, usize)> = HashMap::new();
    let mut current_total = 0.0;
    let mut previous_total = 0.0;

    for obs in observations {
        let date = obs.date_recorded;
        if date >= current_start && date < current_end {
            current_total += obs.price;
            summary.current_month_observations += 1;

            let category = products.get(&obs.product_id).map_or_else(
                || rules.default_category().to_string(),
                |p| rules.category_for(&p.name, p.category.as_deref()),
            );
            let bucket = by_category.entry(category).or_insert((0.0, 0));
            bucket.0 += obs.price;
            bucket.1 += 1;
        } else if date >= previous_start && date < current_start {
            previous_total += obs.price;
            summary.previous_month_observations += 1;
        }
    }

    summary.current_month_total = round_currency(current_total);
    summary.previous_month_total = round_currency(previous_total);
    summary.month_over_month_change = (summary.previous_month_total > 0.0).then(|| {
        round_currency(
            (summary.current_month_total - summary.previous_month_total)
                / summary.previous_month_total
                * 100.0,
        )
    });

    let mut categories: Vec<CategorySpend> = by_category
        .into_iter()
        .map(|(category, (total, observations))| CategorySpend {
            category,
            total: round_currency(total),
            observations,
        })
        .collect();
    categories.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    summary.categories = categories;
    summary
}

/// Dashboard for the current local month.
///
/// Without storage the summary is all zeros.
#[instrument(skip(store, rules))]
pub async fn dashboard_summary(store: &Store, rules: &CategoryRules) -> Result<DashboardSummary> {
    let Some(db) = store.connected() else {
        return Ok(DashboardSummary::default());
    };

    let today = Local::now().date_naive();
    let observations = ledger::observations_since(db, previous_month_start(today)).await?;
    let products: HashMap<i64, product_entity::Model> = product::get_all_products(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(summarize(&observations, &products, rules, today))
}
