//! Database configuration module for `BasketBuddy`.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models.
//!
//! Storage is optional: when no `DATABASE_URL` is configured the application
//! runs with [`Store::Unconfigured`] and every read path degrades to empty
//! results instead of failing.

use crate::entities::{PriceObservation, Product, ProductAlias, ShoppingListEntry};
use crate::errors::{Error, Result};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{info, warn};

/// The persistent store handed to every core operation that needs one.
///
/// This is constructed once at startup and passed down explicitly; there is
/// no global client.
pub enum Store {
    /// A live database connection
    Connected(DatabaseConnection),
    /// No storage configured; reads return empty data, writes fail with
    /// [`Error::NotConfigured`]
    Unconfigured,
}

impl Store {
    /// Returns the live connection or [`Error::NotConfigured`].
    pub fn connection(&self) -> Result<&DatabaseConnection> {
        match self {
            Self::Connected(db) => Ok(db),
            Self::Unconfigured => Err(Error::NotConfigured {
                service: "Storage".to_string(),
            }),
        }
    }

    /// Returns the live connection if there is one.
    #[must_use]
    pub const fn connected(&self) -> Option<&DatabaseConnection> {
        match self {
            Self::Connected(db) => Some(db),
            Self::Unconfigured => None,
        }
    }

    /// Whether a database is available.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// Gets the database URL from the `DATABASE_URL` environment variable.
///
/// Returns `None` when the variable is missing or blank.
#[must_use]
pub fn get_database_url() -> Option<String> {
    std::env::var("DATABASE_URL")
        .ok()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Connects to the configured database and makes sure all tables exist.
///
/// Returns [`Store::Unconfigured`] when no database URL is set.
pub async fn connect_store() -> Result<Store> {
    let Some(database_url) = get_database_url() else {
        warn!("DATABASE_URL is not set; running without storage.");
        return Ok(Store::Unconfigured);
    };

    let db = create_connection(&database_url).await?;
    create_tables(&db).await?;
    info!("Connected to database and ensured tables exist.");
    Ok(Store::Connected(db))
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// Tables that already exist are left untouched.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut product_table = schema.create_table_from_entity(Product);
    let mut alias_table = schema.create_table_from_entity(ProductAlias);
    let mut price_table = schema.create_table_from_entity(PriceObservation);
    let mut list_table = schema.create_table_from_entity(ShoppingListEntry);

    for table in [
        &mut product_table,
        &mut alias_table,
        &mut price_table,
        &mut list_table,
    ] {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    Ok(())
}
