//! Recognized receipts and dictated lists.
//!
//! Everything the recognition service returns is an unverified candidate.
//! Names go through the resolver before they touch the catalog, and prices
//! are validated before they reach the ledger. One bad line never aborts
//! the rest of the receipt.

use crate::{
    core::{
        batch::BatchReport,
        category::CategoryRules,
        ledger::{self, NewObservation},
        matching::OverlapScorer,
        resolver::{self, Catalog, Resolution},
        shopping_list::{self, NewEntry},
    },
    entities::{price_observation, product as product_entity, shopping_list_entry},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, instrument, warn};

/// One line read off a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedItem {
    /// Name as printed
    pub name: String,
    /// Price as printed, `None` when it could not be read
    pub price: Option<f64>,
    /// Store for this line, when the service reports one per item
    pub store_name: Option<String>,
}

/// A decoded receipt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognizedReceipt {
    /// Store printed on the receipt, if recognized
    pub store_name: Option<String>,
    /// Recognized lines
    pub items: Vec<RecognizedItem>,
}

impl RecognizedReceipt {
    /// Store a line belongs to: its own, the receipt's, then `fallback`.
    #[must_use]
    pub fn store_for<'a>(
        &'a self,
        item: &'a RecognizedItem,
        fallback: Option<&'a str>,
    ) -> Option<&'a str> {
        [
            item.store_name.as_deref(),
            self.store_name.as_deref(),
            fallback,
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
    }
}

/// One item of a dictated shopping list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictatedItem {
    /// Product name as dictated
    pub name: String,
    /// Quantity, at least one
    pub quantity: i32,
}

/// How a receipt line would resolve, without writing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    /// The recognized line
    pub item: RecognizedItem,
    /// Store the line would be recorded at
    pub store_name: Option<String>,
    /// Exact match, suggestions or nothing
    pub resolution: Resolution,
}

/// A receipt line that made it into the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedItem {
    /// Position of the line on the receipt
    pub index: usize,
    /// Product the price was recorded for
    pub product: product_entity::Model,
    /// Whether the product was created for this line
    pub created_product: bool,
    /// The stored observation
    pub observation: price_observation::Model,
}

/// Per-line outcome of a receipt ingestion.
pub type IngestReport = BatchReport<IngestedItem>;

/// Resolves every line of a receipt against one catalog snapshot.
#[instrument(skip(db, receipt), fields(items = receipt.items.len()))]
pub async fn review_receipt(
    db: &DatabaseConnection,
    receipt: &RecognizedReceipt,
    fallback_store: Option<&str>,
) -> Result<Vec<ReviewItem>> {
    let catalog = Catalog::load(db).await?;

    Ok(receipt
        .items
        .iter()
        .map(|item| {
            let store_name = receipt.store_for(item, fallback_store);
            let resolution = match catalog.find_exact(&item.name, store_name) {
                Some(product) => Resolution::Exact(product.clone()),
                None => {
                    let suggestions = catalog.suggest(&item.name, &OverlapScorer);
                    if suggestions.is_empty() {
                        Resolution::NoMatch
                    } else {
                        Resolution::Suggestions(suggestions)
                    }
                }
            };
            ReviewItem {
                item: item.clone(),
                store_name: store_name.map(str::to_string),
                resolution,
            }
        })
        .collect())
}

/// The line's price and store, or why it cannot be recorded.
fn check_line<'a>(item: &RecognizedItem, store_name: Option<&'a str>) -> Result<(f64, &'a str)> {
    if item.name.trim().is_empty() {
        return Err(Error::EmptyName);
    }
    let price = item.price.ok_or_else(|| Error::UnreadablePrice {
        name: item.name.clone(),
    })?;
    if !(price.is_finite() && price > 0.0) {
        return Err(Error::InvalidPrice { price });
    }
    let store_name = store_name.ok_or(Error::EmptyStoreName)?;
    Ok((price, store_name))
}

/// Resolves or creates the product and records the price.
///
/// Both writes share one transaction: a product created for a line whose
/// price is then rejected is rolled back with it.
async fn ingest_line(
    db: &DatabaseConnection,
    rules: &CategoryRules,
    index: usize,
    item: &RecognizedItem,
    price: f64,
    store_name: &str,
    date_recorded: NaiveDate,
) -> Result<IngestedItem> {
    let txn = db.begin().await?;

    let (product, created_product) =
        match resolver::find_exact_match(&txn, &item.name, Some(store_name)).await? {
            Some(product) => (product, false),
            None => {
                let category = rules.classify(&item.name).to_string();
                let product = resolver::create_product_from_candidate(
                    &txn,
                    &item.name,
                    Some(category),
                    Some(&item.name),
                    Some(store_name),
                )
                .await?;
                (product, true)
            }
        };

    let observation = ledger::record_observation(
        &txn,
        &NewObservation {
            product_id: product.id,
            store_name: store_name.to_string(),
            price,
            unit_price: None,
            date_recorded,
        },
    )
    .await?;

    txn.commit().await?;
    Ok(IngestedItem {
        index,
        product,
        created_product,
        observation,
    })
}

/// Records every valid line of a receipt.
///
/// Lines resolve through the exact path only; anything without an exact
/// match becomes a new product (category inferred from its name) so the
/// price is not lost. Lines with an empty name, an unreadable or
/// non-positive price, or no store are dropped and reported.
#[instrument(skip(db, rules, receipt), fields(items = receipt.items.len()))]
pub async fn ingest_receipt(
    db: &DatabaseConnection,
    rules: &CategoryRules,
    receipt: &RecognizedReceipt,
    fallback_store: Option<&str>,
    date_recorded: NaiveDate,
) -> IngestReport {
    let mut report = IngestReport::default();

    for (index, item) in receipt.items.iter().enumerate() {
        let (price, store_name) = match check_line(item, receipt.store_for(item, fallback_store)) {
            Ok(checked) => checked,
            Err(err) => {
                report.drop_item(index, err.to_string());
                continue;
            }
        };

        match ingest_line(db, rules, index, item, price, store_name, date_recorded).await {
            Ok(ingested) => report.accepted.push(ingested),
            Err(err) => {
                warn!("Failed to ingest receipt line {} '{}': {}", index, item.name, err);
                report.fail_item(index, err.user_message());
            }
        }
    }

    info!(
        "Ingested receipt: {} recorded, {} dropped, {} failed",
        report.accepted.len(),
        report.dropped.len(),
        report.failed.len()
    );
    report
}

/// Adds dictated items to the shopping list, one outcome per item.
pub async fn add_dictated_items(
    db: &DatabaseConnection,
    items: &[DictatedItem],
) -> BatchReport<shopping_list_entry::Model> {
    let entries: Vec<NewEntry> = items
        .iter()
        .map(|item| NewEntry {
            product_name: item.name.clone(),
            quantity: Some(item.quantity),
        })
        .collect();
    shopping_list::add_entries(db, &entries).await
}
