//! Shared test utilities for `BasketBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{ledger, product, shopping_list},
    entities,
    errors::Result,
};
use chrono::{Duration, Local, NaiveDate};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test product with no explicit category.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::product::Model> {
    product::create_product(db, name, None).await
}

/// Creates a test product with an explicit category.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    category: &str,
) -> Result<entities::product::Model> {
    product::create_product(db, name, Some(category.to_string())).await
}

/// Records a shelf price for a product.
///
/// # Defaults
/// * `unit_price`: None
pub async fn record_test_price(
    db: &DatabaseConnection,
    product_id: i64,
    store_name: &str,
    price: f64,
    date_recorded: NaiveDate,
) -> Result<entities::price_observation::Model> {
    ledger::record_observation(
        db,
        &ledger::NewObservation {
            product_id,
            store_name: store_name.to_string(),
            price,
            unit_price: None,
            date_recorded,
        },
    )
    .await
}

/// Adds an unchecked entry to the shopping list.
pub async fn create_test_entry(
    db: &DatabaseConnection,
    product_name: &str,
    quantity: i32,
) -> Result<entities::shopping_list_entry::Model> {
    shopping_list::add_entry(db, product_name, Some(quantity)).await
}

/// The local date `days` days ago.
pub fn days_ago(days: i64) -> NaiveDate {
    Local::now().date_naive() - Duration::days(days)
}

/// An unsaved product model for pure-function tests.
pub fn test_product_model(id: i64, name: &str) -> entities::product::Model {
    let now = chrono::Utc::now().naive_utc();
    entities::product::Model {
        id,
        name: name.to_string(),
        name_norm: crate::core::matching::normalize_name(name),
        category: None,
        created_at: now,
        updated_at: now,
    }
}

/// An unsaved price observation for pure-function tests.
pub fn test_observation(
    id: i64,
    product_id: i64,
    store_name: &str,
    price: f64,
    date_recorded: NaiveDate,
) -> entities::price_observation::Model {
    entities::price_observation::Model {
        id,
        product_id,
        store_name: store_name.to_string(),
        price,
        unit_price: None,
        date_recorded,
        created_at: chrono::Utc::now().naive_utc(),
    }
}

/// Sets up a database holding the two-store sample catalog:
/// Leche at Lidl 0.89 (most recent) and Mercadona 0.95; Pan at Mercadona
/// 1.20 and Lidl 1.35.
/// Returns (db, leche, pan).
pub async fn setup_with_sample_prices() -> Result<(
    DatabaseConnection,
    entities::product::Model,
    entities::product::Model,
)> {
    let db = setup_test_db().await?;
    let leche = create_test_product(&db, "Leche").await?;
    let pan = create_test_product(&db, "Pan").await?;
    record_test_price(&db, leche.id, "Lidl", 0.99, days_ago(20)).await?;
    record_test_price(&db, leche.id, "Lidl", 0.89, days_ago(1)).await?;
    record_test_price(&db, leche.id, "Mercadona", 0.95, days_ago(3)).await?;
    record_test_price(&db, pan.id, "Mercadona", 1.20, days_ago(2)).await?;
    record_test_price(&db, pan.id, "Lidl", 1.35, days_ago(2)).await?;
    Ok((db, leche, pan))
}
