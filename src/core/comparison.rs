//! Shopping list comparison - cheapest single store vs. per-item split.
//!
//! A comparison run works in two phases:
//!
//! 1. **Lookup**: every pending entry is matched against a catalog snapshot
//!    and its per-store current prices are fetched. Lookups are independent
//!    and run concurrently; a failed lookup marks only its own entry.
//! 2. **Aggregation**: once every lookup has finished, [`build_comparison`]
//!    computes the single-store recommendation, the split baskets and the
//!    savings between them. This step is pure.
//!
//! Only *priceable* entries (those with at least one store price) take part
//! in totals. A store is a single-store candidate only if it prices every
//! priceable entry.

use crate::{
    config::database::Store,
    core::{
        ledger::{self, CurrentPrice},
        matching::normalize_name,
        money::round_currency,
        resolver::Catalog,
        shopping_list,
    },
    entities::shopping_list_entry,
    errors::Result,
};
use chrono::NaiveDate;
use futures::future::join_all;
use sea_orm::ConnectionTrait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Tolerance when comparing a current price to the historical minimum.
const PRICE_EPSILON: f64 = 1e-9;

/// One store's current price for an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    /// Store name as recorded
    pub store_name: String,
    /// Price of one item
    pub unit_price: f64,
    /// `unit_price` times the entry quantity, rounded to cents
    pub total_price: f64,
    /// Day the price was seen
    pub date_recorded: NaiveDate,
    /// Per-kg/litre price from the label, if recorded
    pub label_unit_price: Option<f64>,
}

impl PriceRow {
    fn from_current(current: &CurrentPrice, quantity: i32) -> Self {
        Self {
            store_name: current.store_name.clone(),
            unit_price: current.price,
            total_price: round_currency(current.price * f64::from(quantity)),
            date_recorded: current.date_recorded,
            label_unit_price: current.unit_price,
        }
    }

    fn store_key(&self) -> String {
        normalize_name(&self.store_name)
    }
}

/// Outcome of one entry's price lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    /// At least one store price was found
    Priced,
    /// Nothing matched, or matched products have no prices
    NoData,
    /// The lookup failed; holds the user-facing message
    Failed(String),
}

/// How the cheapest current price compares to every price ever recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceSignal {
    /// Cheapest it has ever been
    AllTimeLow,
    /// More expensive than the historical minimum by `difference`
    AboveHistoricalLow {
        /// Amount above the minimum, rounded to cents
        difference: f64,
    },
    /// No history to compare against
    Unknown,
}

impl PriceSignal {
    /// Classifies a current price against a historical minimum.
    #[must_use]
    pub fn evaluate(current: f64, historical_min: Option<f64>) -> Self {
        match historical_min {
            None => Self::Unknown,
            Some(min) if current <= min + PRICE_EPSILON => Self::AllTimeLow,
            Some(min) => Self::AboveHistoricalLow {
                difference: round_currency(current - min),
            },
        }
    }
}

/// Per-entry price breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductBreakdown {
    /// List entry this breakdown belongs to
    pub entry_id: i64,
    /// Entry name as typed
    pub product_name: String,
    /// Entry quantity
    pub quantity: i32,
    /// Catalog products the entry matched
    pub matched_product_ids: Vec<i64>,
    /// One row per store, cheapest first
    pub prices: Vec<PriceRow>,
    /// Lowest comparable price ever recorded for the matched products
    pub historical_min: Option<f64>,
    /// Cheapest current price vs. `historical_min`
    pub signal: PriceSignal,
    /// Lookup outcome
    pub status: EntryStatus,
}

impl ProductBreakdown {
    /// Breakdown for an entry with no usable data.
    #[must_use]
    pub fn without_prices(entry: &shopping_list_entry::Model, status: EntryStatus) -> Self {
        Self {
            entry_id: entry.id,
            product_name: entry.product_name.clone(),
            quantity: entry.quantity,
            matched_product_ids: Vec::new(),
            prices: Vec::new(),
            historical_min: None,
            signal: PriceSignal::Unknown,
            status,
        }
    }

    /// Whether the entry takes part in totals.
    #[must_use]
    pub fn is_priceable(&self) -> bool {
        !self.prices.is_empty()
    }

    /// The cheapest store for this entry.
    ///
    /// Ties go to the alphabetically first store.
    #[must_use]
    pub fn cheapest(&self) -> Option<&PriceRow> {
        self.prices.iter().min_by(|a, b| compare_rows(a, b))
    }

    fn price_at(&self, store_key: &str) -> Option<&PriceRow> {
        self.prices.iter().find(|row| row.store_key() == store_key)
    }
}

fn compare_rows(a: &PriceRow, b: &PriceRow) -> Ordering {
    a.unit_price
        .total_cmp(&b.unit_price)
        .then_with(|| a.store_key().cmp(&b.store_key()))
}

/// One line of a store basket.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketItem {
    /// Entry name
    pub product_name: String,
    /// Entry quantity
    pub quantity: i32,
    /// Price of one item at this store
    pub unit_price: f64,
    /// Line total
    pub total_price: f64,
}

/// What to buy at one store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreBasket {
    /// Store name
    pub store_name: String,
    /// Lines bought here
    pub items: Vec<BasketItem>,
    /// Sum of line totals, rounded to cents
    pub total: f64,
}

impl StoreBasket {
    fn new(store_name: &str) -> Self {
        Self {
            store_name: store_name.to_string(),
            items: Vec::new(),
            total: 0.0,
        }
    }

    fn push(&mut self, breakdown: &ProductBreakdown, row: &PriceRow) {
        self.items.push(BasketItem {
            product_name: breakdown.product_name.clone(),
            quantity: breakdown.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
        });
        self.total = round_currency(self.items.iter().map(|item| item.total_price).sum());
    }
}

/// Result of comparing a non-empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    /// One breakdown per entry, in list order
    pub products: Vec<ProductBreakdown>,
    /// Cheapest store carrying every priceable entry, if any
    pub best_single_store: Option<StoreBasket>,
    /// Per-item cheapest assignment, one basket per store (alphabetical)
    pub optimized_split: Vec<StoreBasket>,
    /// Sum of the split baskets
    pub split_total: f64,
    /// Single-store total minus split total, never negative
    pub total_savings: f64,
}

impl ComparisonResult {
    /// True when no per-entry lookup failed.
    #[must_use]
    pub fn all_lookups_succeeded(&self) -> bool {
        !self
            .products
            .iter()
            .any(|p| matches!(p.status, EntryStatus::Failed(_)))
    }

    /// Entries that did not resolve to any price.
    pub fn entries_without_data(&self) -> impl Iterator<Item = &ProductBreakdown> {
        self.products
            .iter()
            .filter(|p| p.status == EntryStatus::NoData)
    }
}

/// Outcome of a comparison request.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOutcome {
    /// There was nothing to compare
    EmptyList,
    /// The list was compared
    Compared(ComparisonResult),
}

/// Aggregates finished lookups into recommendations.
#[must_use]
pub fn build_comparison(products: Vec<ProductBreakdown>) -> ComparisonResult {
    let priceable: Vec<&ProductBreakdown> = products.iter().filter(|p| p.is_priceable()).collect();

    // Split: each entry independently at its cheapest store.
    let mut split: BTreeMap<String, StoreBasket> = BTreeMap::new();
    for breakdown in &priceable {
        if let Some(row) = breakdown.cheapest() {
            split
                .entry(row.store_key())
                .or_insert_with(|| StoreBasket::new(&row.store_name))
                .push(breakdown, row);
        }
    }
    let optimized_split: Vec<StoreBasket> = split.into_values().collect();
    let split_total = round_currency(optimized_split.iter().map(|b| b.total).sum());

    // Single store: only stores that price every priceable entry.
    let mut candidates: BTreeMap<String, StoreBasket> = BTreeMap::new();
    if let Some((first, rest)) = priceable.split_first() {
        for row in &first.prices {
            let key = row.store_key();
            if candidates.contains_key(&key) || !rest.iter().all(|p| p.price_at(&key).is_some()) {
                continue;
            }
            let mut basket = StoreBasket::new(&row.store_name);
            for breakdown in &priceable {
                if let Some(store_row) = breakdown.price_at(&key) {
                    basket.push(breakdown, store_row);
                }
            }
            candidates.insert(key, basket);
        }
    }
    let best_single_store = candidates
        .into_values()
        .min_by(|a, b| a.total.total_cmp(&b.total));

    let total_savings = best_single_store
        .as_ref()
        .map_or(0.0, |best| round_currency(best.total - split_total).max(0.0));

    ComparisonResult {
        products,
        best_single_store,
        optimized_split,
        split_total,
        total_savings,
    }
}

/// Looks up current prices for one entry.
///
/// Storage failures are captured in the returned status instead of being
/// propagated, so one bad lookup cannot abort the run.
async fn price_entry<C>(
    db: &C,
    catalog: &Catalog,
    entry: &shopping_list_entry::Model,
) -> ProductBreakdown
where
    C: ConnectionTrait,
{
    let matched = catalog.match_entry(&entry.product_name);
    if matched.is_empty() {
        debug!("'{}' did not match any product", entry.product_name);
        return ProductBreakdown::without_prices(entry, EntryStatus::NoData);
    }

    let observations = match ledger::observations_for_products(db, &matched).await {
        Ok(observations) => observations,
        Err(err) => {
            warn!("Price lookup for '{}' failed: {}", entry.product_name, err);
            return ProductBreakdown::without_prices(entry, EntryStatus::Failed(err.user_message()));
        }
    };

    let mut prices: Vec<PriceRow> = ledger::pick_current_prices(&observations)
        .values()
        .map(|current| PriceRow::from_current(current, entry.quantity))
        .collect();
    prices.sort_by(compare_rows);

    let historical_min = ledger::min_comparable_price(&observations);
    let signal = prices.first().map_or(PriceSignal::Unknown, |row| {
        PriceSignal::evaluate(
            ledger::comparable_price(row.unit_price, row.label_unit_price),
            historical_min,
        )
    });
    let status = if prices.is_empty() {
        EntryStatus::NoData
    } else {
        EntryStatus::Priced
    };

    ProductBreakdown {
        entry_id: entry.id,
        product_name: entry.product_name.clone(),
        quantity: entry.quantity,
        matched_product_ids: matched,
        prices,
        historical_min,
        signal,
        status,
    }
}

/// Compares the given entries against the ledger.
///
/// # Errors
/// Returns an error only if the catalog snapshot cannot be loaded; per-entry
/// failures are reported in each breakdown's status.
#[instrument(skip(db, entries), fields(entries = entries.len()))]
pub async fn compare_entries<C>(
    db: &C,
    entries: &[shopping_list_entry::Model],
) -> Result<ComparisonOutcome>
where
    C: ConnectionTrait,
{
    if entries.is_empty() {
        return Ok(ComparisonOutcome::EmptyList);
    }

    let catalog = Catalog::load(db).await?;
    let products = join_all(
        entries
            .iter()
            .map(|entry| price_entry(db, &catalog, entry)),
    )
    .await;

    let result = build_comparison(products);
    info!(
        "Compared {} entries: split {:.2}, savings {:.2}",
        result.products.len(),
        result.split_total,
        result.total_savings
    );
    Ok(ComparisonOutcome::Compared(result))
}

/// Compares the pending (unchecked) shopping list.
///
/// Without storage there is no list, so the outcome is [`ComparisonOutcome::EmptyList`].
pub async fn compare_pending_list(store: &Store) -> Result<ComparisonOutcome> {
    let Some(db) = store.connected() else {
        return Ok(ComparisonOutcome::EmptyList);
    };
    let entries = shopping_list::get_pending_entries(db).await?;
    compare_entries(db, &entries).await
}
