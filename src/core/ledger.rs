//! Price ledger - recorded (product, store, price, date) observations.
//!
//! Observations are append-mostly. The **current price** of a product at a
//! store is the observation with the latest `date_recorded`; ties go to the
//! most recently inserted row (highest id). Store names are free text and
//! compared in normalized form, so "Lidl" and "LIDL " are the same store.

use crate::{
    core::{batch::BatchReport, matching::normalize_name},
    entities::{PriceObservation, Product, price_observation},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};

/// A price to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    /// Observed product
    pub product_id: i64,
    /// Store the price was seen at
    pub store_name: String,
    /// Shelf price, must be positive
    pub price: f64,
    /// Optional per-unit (kg, litre) price from the label
    pub unit_price: Option<f64>,
    /// Day the price was seen
    pub date_recorded: NaiveDate,
}

/// The most recent observation for one (product, store) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPrice {
    /// Store name as it was recorded
    pub store_name: String,
    /// Shelf price
    pub price: f64,
    /// Label unit price, if any
    pub unit_price: Option<f64>,
    /// Day the price was seen
    pub date_recorded: NaiveDate,
    /// Observation the price comes from
    pub observation_id: i64,
}

impl From<&price_observation::Model> for CurrentPrice {
    fn from(obs: &price_observation::Model) -> Self {
        Self {
            store_name: obs.store_name.clone(),
            price: obs.price,
            unit_price: obs.unit_price,
            date_recorded: obs.date_recorded,
            observation_id: obs.id,
        }
    }
}

/// Parses a `YYYY-MM-DD` date as typed by a user.
///
/// # Errors
/// [`Error::InvalidDate`] when the text is not a calendar date.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate {
        value: text.to_string(),
    })
}

fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Checks the invariants of an observation before it is stored.
///
/// # Errors
/// - [`Error::InvalidPrice`] for a price (or unit price) that is not positive
/// - [`Error::EmptyStoreName`] for a blank store
pub fn validate_observation(observation: &NewObservation) -> Result<()> {
    if !is_valid_price(observation.price) {
        return Err(Error::InvalidPrice {
            price: observation.price,
        });
    }
    if let Some(unit_price) = observation.unit_price {
        if !is_valid_price(unit_price) {
            return Err(Error::InvalidPrice { price: unit_price });
        }
    }
    if observation.store_name.trim().is_empty() {
        return Err(Error::EmptyStoreName);
    }
    Ok(())
}

/// Stores one price observation.
///
/// # Errors
/// Returns an error if:
/// - The observation fails [`validate_observation`]
/// - The product does not exist
/// - The database insert operation fails
#[instrument(skip(db))]
pub async fn record_observation<C>(
    db: &C,
    observation: &NewObservation,
) -> Result<price_observation::Model>
where
    C: ConnectionTrait,
{
    validate_observation(observation)?;

    if Product::find_by_id(observation.product_id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(Error::ProductNotFound {
            name: observation.product_id.to_string(),
        });
    }

    let model = price_observation::ActiveModel {
        product_id: Set(observation.product_id),
        store_name: Set(observation.store_name.trim().to_string()),
        price: Set(observation.price),
        unit_price: Set(observation.unit_price),
        date_recorded: Set(observation.date_recorded),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let stored = model.insert(db).await?;
    debug!(
        "Recorded {:.2} for product {} at {}",
        stored.price, stored.product_id, stored.store_name
    );
    Ok(stored)
}

/// Stores a batch of observations, one outcome per record.
///
/// Invalid records and records pointing at a missing product are dropped;
/// storage failures are reported as failed. Neither stops the batch.
pub async fn record_observations(
    db: &DatabaseConnection,
    observations: &[NewObservation],
) -> BatchReport<price_observation::Model> {
    let mut report = BatchReport::default();

    for (index, observation) in observations.iter().enumerate() {
        match record_observation(db, observation).await {
            Ok(stored) => report.accepted.push(stored),
            Err(
                err @ (Error::InvalidPrice { .. }
                | Error::EmptyStoreName
                | Error::ProductNotFound { .. }),
            ) => {
                debug!("Dropping observation {}: {}", index, err);
                report.drop_item(index, err.to_string());
            }
            Err(err) => {
                warn!("Failed to store observation {}: {}", index, err);
                report.fail_item(index, err.user_message());
            }
        }
    }

    info!(
        "Recorded {} observations ({} dropped, {} failed)",
        report.accepted.len(),
        report.dropped.len(),
        report.failed.len()
    );
    report
}

/// Observations for a set of products, newest first (ties: highest id first).
pub async fn observations_for_products<C>(
    db: &C,
    product_ids: &[i64],
) -> Result<Vec<price_observation::Model>>
where
    C: ConnectionTrait,
{
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }
    PriceObservation::find()
        .filter(price_observation::Column::ProductId.is_in(product_ids.iter().copied()))
        .order_by_desc(price_observation::Column::DateRecorded)
        .order_by_desc(price_observation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Most recent observation per store, keyed by normalized store name.
///
/// Works on any slice of observations, including a merged set spanning
/// several products: the latest `date_recorded` wins, then the highest id.
#[must_use]
pub fn pick_current_prices(
    observations: &[price_observation::Model],
) -> BTreeMap<String, CurrentPrice> {
    let mut sorted: Vec<&price_observation::Model> = observations.iter().collect();
    sorted.sort_by(|a, b| {
        b.date_recorded
            .cmp(&a.date_recorded)
            .then_with(|| b.id.cmp(&a.id))
    });

    let mut current = BTreeMap::new();
    for obs in sorted {
        current
            .entry(normalize_name(&obs.store_name))
            .or_insert_with(|| CurrentPrice::from(obs));
    }
    current
}

/// Current price per store for each requested product.
///
/// Products without observations are absent from the map.
#[instrument(skip(db))]
pub async fn current_prices_by_store<C>(
    db: &C,
    product_ids: &[i64],
) -> Result<HashMap<i64, BTreeMap<String, CurrentPrice>>>
where
    C: ConnectionTrait,
{
    let mut by_product: HashMap<i64, Vec<price_observation::Model>> = HashMap::new();
    for obs in observations_for_products(db, product_ids).await? {
        by_product.entry(obs.product_id).or_default().push(obs);
    }
    Ok(by_product
        .into_iter()
        .map(|(product_id, observations)| (product_id, pick_current_prices(&observations)))
        .collect())
}

/// The value used for historical comparisons: unit price when present,
/// else the shelf price.
#[must_use]
pub fn comparable_price(price: f64, unit_price: Option<f64>) -> f64 {
    unit_price.unwrap_or(price)
}

/// Minimum positive comparable price ever recorded in `observations`.
#[must_use]
pub fn min_comparable_price(observations: &[price_observation::Model]) -> Option<f64> {
    observations
        .iter()
        .map(|obs| comparable_price(obs.price, obs.unit_price))
        .filter(|value| is_valid_price(*value))
        .min_by(f64::total_cmp)
}

/// Minimum ever recorded comparable price for each requested product.
///
/// Products with no positive observations are absent from the map.
pub async fn min_historical_unit_price<C>(
    db: &C,
    product_ids: &[i64],
) -> Result<HashMap<i64, f64>>
where
    C: ConnectionTrait,
{
    let mut by_product: HashMap<i64, Vec<price_observation::Model>> = HashMap::new();
    for obs in observations_for_products(db, product_ids).await? {
        by_product.entry(obs.product_id).or_default().push(obs);
    }
    Ok(by_product
        .into_iter()
        .filter_map(|(product_id, observations)| {
            min_comparable_price(&observations).map(|min| (product_id, min))
        })
        .collect())
}

/// Every observation of one product, newest first.
pub async fn price_history<C>(db: &C, product_id: i64) -> Result<Vec<price_observation::Model>>
where
    C: ConnectionTrait,
{
    observations_for_products(db, &[product_id]).await
}

/// Every stored observation, newest first.
pub async fn get_all_observations<C>(db: &C) -> Result<Vec<price_observation::Model>>
where
    C: ConnectionTrait,
{
    PriceObservation::find()
        .order_by_desc(price_observation::Column::DateRecorded)
        .order_by_desc(price_observation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Observations recorded on or after `since`, newest first.
pub async fn observations_since<C>(db: &C, since: NaiveDate) -> Result<Vec<price_observation::Model>>
where
    C: ConnectionTrait,
{
    PriceObservation::find()
        .filter(price_observation::Column::DateRecorded.gte(since))
        .order_by_desc(price_observation::Column::DateRecorded)
        .order_by_desc(price_observation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Corrects the price of a single observation.
///
/// # Errors
/// Returns an error if:
/// - The new price or unit price is not positive
/// - The observation does not exist
/// - The database update operation fails
#[instrument(skip(db))]
pub async fn update_observation(
    db: &DatabaseConnection,
    observation_id: i64,
    price: f64,
    unit_price: Option<f64>,
) -> Result<price_observation::Model> {
    if !is_valid_price(price) {
        return Err(Error::InvalidPrice { price });
    }
    if let Some(unit_price) = unit_price.filter(|u| !is_valid_price(*u)) {
        return Err(Error::InvalidPrice { price: unit_price });
    }

    let existing = PriceObservation::find_by_id(observation_id)
        .one(db)
        .await?
        .ok_or(Error::ObservationNotFound { id: observation_id })?;

    let mut active: price_observation::ActiveModel = existing.into();
    active.price = Set(price);
    active.unit_price = Set(unit_price);
    let updated = active.update(db).await?;
    info!("Corrected observation {} to {:.2}", updated.id, updated.price);
    Ok(updated)
}

/// Deletes a single observation.
///
/// # Errors
/// Returns [`Error::ObservationNotFound`] if nothing was deleted.
pub async fn delete_observation(db: &DatabaseConnection, observation_id: i64) -> Result<()> {
    let result = PriceObservation::delete_by_id(observation_id)
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::ObservationNotFound { id: observation_id });
    }
    info!("Deleted observation {}", observation_id);
    Ok(())
}

/// Distinct store names seen in the ledger, alphabetically.
///
/// Spellings that normalize to the same store collapse to the most recently
/// recorded one.
pub async fn known_stores<C>(db: &C) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    let observations = get_all_observations(db).await?;
    let mut stores: BTreeMap<String, String> = BTreeMap::new();
    for obs in observations {
        stores
            .entry(normalize_name(&obs.store_name))
            .or_insert(obs.store_name);
    }
    Ok(stores.into_values().collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn observation(product_id: i64, store: &str, price: f64) -> NewObservation {
        NewObservation {
            product_id,
            store_name: store.to_string(),
            price,
            unit_price: None,
            date_recorded: days_ago(0),
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2024-02-29 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(matches!(
            parse_date("2023-02-29"),
            Err(Error::InvalidDate { .. })
        ));
        assert!(matches!(parse_date("29/02/2024"), Err(Error::InvalidDate { .. })));
    }

    #[tokio::test]
    async fn test_record_observation_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for price in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            let result = record_observation(&db, &observation(1, "Lidl", price)).await;
            assert!(matches!(result.unwrap_err(), Error::InvalidPrice { .. }));
        }

        let result = record_observation(&db, &observation(1, "  ", 1.0)).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyStoreName));

        let mut bad_unit = observation(1, "Lidl", 1.0);
        bad_unit.unit_price = Some(0.0);
        let result = record_observation(&db, &bad_unit).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidPrice { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_record_observation_requires_product() -> Result<()> {
        let db = setup_test_db().await?;
        let result = record_observation(&db, &observation(42, "Lidl", 1.0)).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_observations_batch_outcomes() -> Result<()> {
        let db = setup_test_db().await?;
        let leche = create_test_product(&db, "Leche").await?;

        let report = record_observations(
            &db,
            &[
                observation(leche.id, "Lidl", 0.89),
                observation(leche.id, "Lidl", 0.0),
                observation(999, "Lidl", 1.0),
                observation(leche.id, " Mercadona ", 0.95),
            ],
        )
        .await;

        assert!(report.is_success());
        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.accepted[1].store_name, "Mercadona");
        let dropped: Vec<usize> = report.dropped.iter().map(|d| d.index).collect();
        assert_eq!(dropped, vec![1, 2]);
        assert_eq!(price_history(&db, leche.id).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_current_price_is_latest_date() -> Result<()> {
        let db = setup_test_db().await?;
        let leche = create_test_product(&db, "Leche").await?;
        record_test_price(&db, leche.id, "Lidl", 0.79, days_ago(10)).await?;
        record_test_price(&db, leche.id, "Lidl", 0.89, days_ago(1)).await?;
        // Inserted last but older
        record_test_price(&db, leche.id, "LIDL", 0.99, days_ago(5)).await?;
        record_test_price(&db, leche.id, "Mercadona", 0.95, days_ago(3)).await?;

        let prices = current_prices_by_store(&db, &[leche.id]).await?;
        let stores = &prices[&leche.id];

        assert_eq!(stores.len(), 2);
        assert_eq!(stores["lidl"].price, 0.89);
        assert_eq!(stores["lidl"].date_recorded, days_ago(1));
        assert_eq!(stores["mercadona"].price, 0.95);

        Ok(())
    }

    #[tokio::test]
    async fn test_current_price_tie_goes_to_latest_insert() -> Result<()> {
        let db = setup_test_db().await?;
        let pan = create_test_product(&db, "Pan").await?;
        record_test_price(&db, pan.id, "Dia", 1.10, days_ago(2)).await?;
        let latest = record_test_price(&db, pan.id, "Dia", 1.05, days_ago(2)).await?;

        let prices = current_prices_by_store(&db, &[pan.id]).await?;
        assert_eq!(prices[&pan.id]["dia"].observation_id, latest.id);
        assert_eq!(prices[&pan.id]["dia"].price, 1.05);

        Ok(())
    }

    #[tokio::test]
    async fn test_current_prices_for_unknown_products() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(current_prices_by_store(&db, &[]).await?.is_empty());
        assert!(current_prices_by_store(&db, &[7]).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_min_historical_unit_price() -> Result<()> {
        let db = setup_test_db().await?;
        let aceite = create_test_product(&db, "Aceite").await?;
        let pan = create_test_product(&db, "Pan").await?;
        record_test_price(&db, aceite.id, "Lidl", 8.50, days_ago(30)).await?;
        record_test_price(&db, aceite.id, "Lidl", 9.20, days_ago(1)).await?;
        record_observation(
            &db,
            &NewObservation {
                product_id: aceite.id,
                store_name: "Dia".to_string(),
                price: 9.00,
                unit_price: Some(7.90),
                date_recorded: days_ago(5),
            },
        )
        .await?;

        let mins = min_historical_unit_price(&db, &[aceite.id, pan.id]).await?;
        assert_eq!(mins.get(&aceite.id), Some(&7.90));
        assert!(!mins.contains_key(&pan.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_price_history_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let leche = create_test_product(&db, "Leche").await?;
        record_test_price(&db, leche.id, "Lidl", 0.79, days_ago(10)).await?;
        record_test_price(&db, leche.id, "Lidl", 0.89, days_ago(1)).await?;

        let history = price_history(&db, leche.id).await?;
        let prices: Vec<f64> = history.iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![0.89, 0.79]);

        let recent = observations_since(&db, days_ago(5)).await?;
        assert_eq!(recent.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_observation() -> Result<()> {
        let db = setup_test_db().await?;
        let leche = create_test_product(&db, "Leche").await?;
        let obs = record_test_price(&db, leche.id, "Lidl", 8.9, days_ago(1)).await?;

        let updated = update_observation(&db, obs.id, 0.89, None).await?;
        assert_eq!(updated.price, 0.89);

        let invalid = update_observation(&db, obs.id, 0.0, None).await;
        assert!(matches!(invalid.unwrap_err(), Error::InvalidPrice { .. }));

        delete_observation(&db, obs.id).await?;
        let missing = delete_observation(&db, obs.id).await;
        assert!(matches!(
            missing.unwrap_err(),
            Error::ObservationNotFound { .. }
        ));
        let missing = update_observation(&db, obs.id, 1.0, None).await;
        assert!(matches!(
            missing.unwrap_err(),
            Error::ObservationNotFound { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_known_stores_are_distinct() -> Result<()> {
        let db = setup_test_db().await?;
        let leche = create_test_product(&db, "Leche").await?;
        record_test_price(&db, leche.id, "LIDL", 0.89, days_ago(5)).await?;
        record_test_price(&db, leche.id, "Lidl", 0.89, days_ago(1)).await?;
        record_test_price(&db, leche.id, "Mercadona", 0.95, days_ago(1)).await?;

        assert_eq!(known_stores(&db).await?, vec!["Lidl", "Mercadona"]);
        Ok(())
    }
}
