//! Text reports for comparisons, dashboards and price histories.
//!
//! This module turns the structured results of the core into plain markdown
//! strings. Nothing here is Discord-specific; the bot layer only decides
//! where the text goes.

use crate::{
    core::{
        batch::BatchReport,
        comparison::{ComparisonResult, EntryStatus, PriceSignal, ProductBreakdown, StoreBasket},
        dashboard::DashboardSummary,
        money::format_currency,
    },
    entities::price_observation,
};
use std::fmt::Write;

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
///
/// # Arguments
/// * `progress_percent` - Progress percentage (0-100)
/// * `bar_length` - Length of the progress bar in characters (default 10)
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // Cast safety: clamped_progress ∈ [0, 100], length is small (10-20).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}

/// Share of `part` in `total` as a percentage, 0 when `total` is 0.
#[must_use]
pub fn calculate_share(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (part / total) * 100.0
}

/// Formats a month-over-month change like "+12.5%" or "-3.0%".
#[must_use]
pub fn format_change(change: Option<f64>) -> String {
    match change {
        Some(percent) if percent >= 0.0 => format!("+{percent:.1}%"),
        Some(percent) => format!("-{:.1}%", percent.abs()),
        None => "n/a".to_string(),
    }
}

/// Short label for a price signal, `None` when there is nothing to say.
#[must_use]
pub fn format_signal(signal: PriceSignal) -> Option<String> {
    match signal {
        PriceSignal::AllTimeLow => Some("📉 lowest price ever recorded".to_string()),
        PriceSignal::AboveHistoricalLow { difference } => Some(format!(
            "📈 {} above its lowest",
            format_currency(difference)
        )),
        PriceSignal::Unknown => None,
    }
}

/// One line per basket item plus the basket total.
#[must_use]
pub fn format_basket(basket: &StoreBasket) -> String {
    let mut text = String::new();
    for item in &basket.items {
        let _ = writeln!(
            text,
            "• {} x{} @ {} = {}",
            item.product_name,
            item.quantity,
            format_currency(item.unit_price),
            format_currency(item.total_price)
        );
    }
    let _ = write!(text, "**Total: {}**", format_currency(basket.total));
    text
}

/// One line describing an entry's prices.
#[must_use]
pub fn format_breakdown(breakdown: &ProductBreakdown) -> String {
    let header = format!("**{}** x{}", breakdown.product_name, breakdown.quantity);
    match &breakdown.status {
        EntryStatus::NoData => format!("{header}: no price data"),
        EntryStatus::Failed(message) => format!("{header}: lookup failed ({message})"),
        EntryStatus::Priced => {
            let stores: Vec<String> = breakdown
                .prices
                .iter()
                .map(|row| format!("{} {}", row.store_name, format_currency(row.total_price)))
                .collect();
            let mut line = format!("{header}: {}", stores.join(" · "));
            if let Some(signal) = format_signal(breakdown.signal) {
                let _ = write!(line, " ({signal})");
            }
            line
        }
    }
}

/// Room kept for the "…and N more items" line.
const OMITTED_LINE_RESERVE: usize = 32;

/// Best single store, split baskets, savings and warnings.
///
/// With `detailed` every basket lists its items; otherwise only store totals.
fn format_comparison_summary(result: &ComparisonResult, detailed: bool) -> String {
    let mut text = String::new();

    let _ = writeln!(text, "\n**Best single store**");
    match &result.best_single_store {
        Some(best) if detailed => {
            let _ = writeln!(text, "🏪 {}", best.store_name);
            let _ = writeln!(text, "{}", format_basket(best));
        }
        Some(best) => {
            let _ = writeln!(text, "🏪 {}: {}", best.store_name, format_currency(best.total));
        }
        None => {
            let _ = writeln!(text, "No single store carries every item.");
        }
    }

    if !result.optimized_split.is_empty() {
        let _ = writeln!(text, "\n**Cheapest split**");
        for basket in &result.optimized_split {
            if detailed {
                let _ = writeln!(text, "🛒 {}", basket.store_name);
                let _ = writeln!(text, "{}", format_basket(basket));
            } else {
                let _ = writeln!(
                    text,
                    "🛒 {}: {} ({} items)",
                    basket.store_name,
                    format_currency(basket.total),
                    basket.items.len()
                );
            }
        }
        let _ = writeln!(text, "Split total: {}", format_currency(result.split_total));
    }

    if result.total_savings > 0.0 {
        let _ = writeln!(
            text,
            "\n💰 Splitting saves **{}**",
            format_currency(result.total_savings)
        );
    }
    if !result.all_lookups_succeeded() {
        let _ = writeln!(text, "\n⚠️ Some prices could not be loaded.");
    }
    text.trim_end().to_string()
}

/// Full comparison report, at most `max_chars` characters long.
///
/// Totals and savings always survive: per-item lines are dropped first,
/// then basket contents are collapsed to store totals.
#[must_use]
pub fn format_comparison(result: &ComparisonResult, max_chars: usize) -> String {
    let header = "**Prices per item**\n";
    let mut summary = format_comparison_summary(result, true);
    if header.chars().count() + summary.chars().count() + OMITTED_LINE_RESERVE > max_chars {
        summary = format_comparison_summary(result, false);
    }

    let budget = max_chars.saturating_sub(summary.chars().count() + OMITTED_LINE_RESERVE);
    let mut text = header.to_string();
    let mut used = header.chars().count();
    let mut shown = 0;
    for breakdown in &result.products {
        let line = format_breakdown(breakdown);
        let line_len = line.chars().count() + 1;
        if used + line_len > budget {
            break;
        }
        let _ = writeln!(text, "{line}");
        used += line_len;
        shown += 1;
    }
    if shown < result.products.len() {
        let _ = writeln!(text, "…and {} more items", result.products.len() - shown);
    }

    text.push_str(&summary);
    truncate_message(text.trim_end(), max_chars)
}

/// Dashboard report with a bar per category.
#[must_use]
pub fn format_dashboard(summary: &DashboardSummary) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "**This month:** {} ({} prices)",
        format_currency(summary.current_month_total),
        summary.current_month_observations
    );
    let _ = writeln!(
        text,
        "**Last month:** {} ({} prices)",
        format_currency(summary.previous_month_total),
        summary.previous_month_observations
    );
    let _ = writeln!(
        text,
        "**Change:** {}",
        format_change(summary.month_over_month_change)
    );

    if !summary.categories.is_empty() {
        let _ = writeln!(text, "\n**By category**");
        for category in &summary.categories {
            let share = calculate_share(category.total, summary.current_month_total);
            let _ = writeln!(
                text,
                "{} {}: {}",
                format_progress_bar(share, Some(10)),
                category.category,
                format_currency(category.total)
            );
        }
    }
    text.trim_end().to_string()
}

/// Generates a summary line for a price observation.
#[must_use]
pub fn format_observation(observation: &price_observation::Model) -> String {
    let unit = observation
        .unit_price
        .map(|u| format!(" ({}/unit)", format_currency(u)))
        .unwrap_or_default();
    format!(
        "{} | {} | {}{unit} | #{}",
        observation.date_recorded.format("%Y-%m-%d"),
        observation.store_name,
        format_currency(observation.price),
        observation.id
    )
}

/// Discord rejects messages longer than this.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Cuts `text` to at most `max_chars` characters, ending with "…" when cut.
#[must_use]
pub fn truncate_message(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Counts of a batch outcome followed by one line per dropped or failed record.
///
/// Record positions are shown one-based.
#[must_use]
pub fn format_batch_summary<T>(report: &BatchReport<T>, noun: &str) -> String {
    let mut text = format!("✅ {} {noun} saved", report.accepted.len());
    if !report.dropped.is_empty() {
        let _ = write!(text, ", {} skipped", report.dropped.len());
    }
    if !report.failed.is_empty() {
        let _ = write!(text, ", {} failed", report.failed.len());
    }
    for dropped in &report.dropped {
        let _ = write!(text, "\n• #{} skipped: {}", dropped.index + 1, dropped.reason);
    }
    for failed in &report.failed {
        let _ = write!(text, "\n• #{} failed: {}", failed.index + 1, failed.message);
    }
    text
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::comparison::{BasketItem, PriceRow};
    use crate::core::dashboard::CategorySpend;
    use crate::test_utils::*;

    fn basket(store: &str, total: f64) -> StoreBasket {
        StoreBasket {
            store_name: store.to_string(),
            items: vec![BasketItem {
                product_name: "Leche".to_string(),
                quantity: 2,
                unit_price: total / 2.0,
                total_price: total,
            }],
            total,
        }
    }

    #[test]
    fn test_format_progress_bar() {
        assert_eq!(format_progress_bar(100.0, Some(10)), "[██████████] 100.0%");
        assert_eq!(format_progress_bar(50.0, Some(10)), "[█████░░░░░] 50.0%");
        assert_eq!(format_progress_bar(0.0, Some(4)), "[░░░░] 0.0%");
    }

    #[test]
    fn test_calculate_share() {
        assert_eq!(calculate_share(1.0, 4.0), 25.0);
        assert_eq!(calculate_share(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(Some(12.5)), "+12.5%");
        assert_eq!(format_change(Some(-3.0)), "-3.0%");
        assert_eq!(format_change(None), "n/a");
    }

    #[test]
    fn test_format_basket() {
        assert_eq!(
            format_basket(&basket("Lidl", 1.78)),
            "• Leche x2 @ 0.89 € = 1.78 €\n**Total: 1.78 €**"
        );
    }

    #[test]
    fn test_format_breakdown_statuses() {
        let mut breakdown = ProductBreakdown {
            entry_id: 1,
            product_name: "Pan".to_string(),
            quantity: 1,
            matched_product_ids: vec![1],
            prices: vec![PriceRow {
                store_name: "Mercadona".to_string(),
                unit_price: 1.2,
                total_price: 1.2,
                date_recorded: days_ago(0),
                label_unit_price: None,
            }],
            historical_min: Some(1.2),
            signal: PriceSignal::AllTimeLow,
            status: EntryStatus::Priced,
        };
        assert_eq!(
            format_breakdown(&breakdown),
            "**Pan** x1: Mercadona 1.20 € (📉 lowest price ever recorded)"
        );

        breakdown.status = EntryStatus::NoData;
        assert_eq!(format_breakdown(&breakdown), "**Pan** x1: no price data");
    }

    #[test]
    fn test_format_comparison_mentions_savings() {
        let result = ComparisonResult {
            products: Vec::new(),
            best_single_store: Some(basket("Mercadona", 3.10)),
            optimized_split: vec![basket("Lidl", 1.78), basket("Mercadona", 1.20)],
            split_total: 2.98,
            total_savings: 0.12,
        };
        let text = format_comparison(&result, MAX_MESSAGE_LENGTH);
        assert!(text.starts_with("**Prices per item**"));
        assert!(text.contains("🏪 Mercadona"));
        assert!(text.contains("Split total: 2.98 €"));
        assert!(text.contains("Splitting saves **0.12 €**"));
    }

    #[test]
    fn test_long_comparison_keeps_totals_within_limit() {
        let stores = ["Alcampo", "Carrefour", "Dia", "Lidl", "Mercadona"];
        let products: Vec<ProductBreakdown> = (0..30)
            .map(|i| ProductBreakdown {
                entry_id: i,
                product_name: format!("Producto de prueba número {i}"),
                quantity: 2,
                matched_product_ids: vec![i],
                prices: stores
                    .iter()
                    .map(|store| PriceRow {
                        store_name: (*store).to_string(),
                        unit_price: 1.25,
                        total_price: 2.50,
                        date_recorded: days_ago(0),
                        label_unit_price: None,
                    })
                    .collect(),
                historical_min: Some(1.0),
                signal: PriceSignal::AboveHistoricalLow { difference: 0.25 },
                status: EntryStatus::Priced,
            })
            .collect();
        let full_basket = |store: &str, total: f64| StoreBasket {
            store_name: store.to_string(),
            items: products
                .iter()
                .map(|p| BasketItem {
                    product_name: p.product_name.clone(),
                    quantity: 2,
                    unit_price: 1.25,
                    total_price: 2.50,
                })
                .collect(),
            total,
        };
        let result = ComparisonResult {
            best_single_store: Some(full_basket("Mercadona", 80.00)),
            optimized_split: vec![full_basket("Lidl", 75.00)],
            products,
            split_total: 75.00,
            total_savings: 5.00,
        };

        let text = format_comparison(&result, MAX_MESSAGE_LENGTH);
        assert!(text.chars().count() <= MAX_MESSAGE_LENGTH);
        assert!(text.contains("more items"));
        assert!(text.contains("🏪 Mercadona: 80.00 €"));
        assert!(text.contains("Split total: 75.00 €"));
        assert!(text.ends_with("💰 Splitting saves **5.00 €**"));
    }

    #[test]
    fn test_format_dashboard() {
        let summary = DashboardSummary {
            current_month_total: 10.0,
            previous_month_total: 8.0,
            month_over_month_change: Some(25.0),
            categories: vec![CategorySpend {
                category: "Lácteos".to_string(),
                total: 5.0,
                observations: 3,
            }],
            current_month_observations: 4,
            previous_month_observations: 2,
        };
        let text = format_dashboard(&summary);
        assert!(text.contains("**This month:** 10.00 € (4 prices)"));
        assert!(text.contains("**Change:** +25.0%"));
        assert!(text.contains("[█████░░░░░] 50.0% Lácteos: 5.00 €"));
    }

    #[test]
    fn test_truncate_message() {
        assert_eq!(truncate_message("Leche", 10), "Leche");
        assert_eq!(truncate_message("Leche entera", 6), "Leche…");
        assert_eq!(truncate_message("€€€€", 3).chars().count(), 3);
    }

    #[test]
    fn test_format_batch_summary() {
        let mut report: BatchReport<i64> = BatchReport::default();
        report.accepted.push(1);
        assert_eq!(format_batch_summary(&report, "prices"), "✅ 1 prices saved");

        report.drop_item(1, "Price must be positive, got 0");
        report.fail_item(2, "database is locked");
        assert_eq!(
            format_batch_summary(&report, "prices"),
            "✅ 1 prices saved, 1 skipped, 1 failed\n\
             • #2 skipped: Price must be positive, got 0\n\
             • #3 failed: database is locked"
        );
    }

    #[test]
    fn test_format_observation() {
        let obs = test_observation(7, 1, "Lidl", 0.89, days_ago(0));
        let line = format_observation(&obs);
        assert!(line.ends_with("| Lidl | 0.89 € | #7"));
    }
}
