//! Product business logic - Handles all catalog operations.
//!
//! Products are the canonical identities that prices and aliases hang off.
//! They are never removed implicitly; [`delete_product`] is the explicit admin
//! action and cascades to the product's aliases and price observations.
//! [`merge_products`] folds a duplicate into the product being kept.

use crate::{
    core::matching::normalize_name,
    entities::{PriceObservation, Product, ProductAlias, price_observation, product, product_alias},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// Rows removed by a cascading product delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Number of aliases removed
    pub aliases_removed: u64,
    /// Number of price observations removed
    pub observations_removed: u64,
}

/// Rows moved by a product merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    /// The product that absorbed the duplicate
    pub kept: product::Model,
    /// Price observations moved onto the kept product
    pub observations_moved: u64,
    /// Aliases moved onto the kept product
    pub aliases_moved: u64,
}

fn clean_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Retrieves every product, ordered alphabetically by name.
pub async fn get_all_products<C>(db: &C) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a product whose normalized name equals the normalized `name`.
///
/// Returns the oldest one if several share a name.
pub async fn get_product_by_name<C>(db: &C, name: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    let name_norm = normalize_name(name);
    if name_norm.is_empty() {
        return Ok(None);
    }
    Product::find()
        .filter(product::Column::NameNorm.eq(name_norm))
        .order_by_asc(product::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product.
///
/// The name is trimmed and stored alongside its normalized form. A blank
/// category is stored as `None`.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The database insert operation fails
#[instrument(skip(db))]
pub async fn create_product<C>(
    db: &C,
    name: &str,
    category: Option<String>,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    let now = chrono::Utc::now().naive_utc();
    let product = product::ActiveModel {
        name: Set(name.to_string()),
        name_norm: Set(normalize_name(name)),
        category: Set(clean_category(category)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let product = product.insert(db).await?;
    info!("Created product '{}' (ID: {})", product.name, product.id);
    Ok(product)
}

/// Renames a product and/or changes its category.
///
/// # Errors
/// Returns an error if:
/// - The new name is empty or whitespace-only
/// - The product does not exist
/// - The database update operation fails
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    new_name: &str,
    category: Option<String>,
) -> Result<product::Model> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(Error::EmptyName);
    }

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })?
        .into();

    product.name = Set(new_name.to_string());
    product.name_norm = Set(normalize_name(new_name));
    product.category = Set(clean_category(category));
    product.updated_at = Set(chrono::Utc::now().naive_utc());

    product.update(db).await.map_err(Into::into)
}

/// Deletes a product together with its aliases and price observations.
///
/// All three deletes run in one database transaction.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist
/// - Any of the delete statements fails
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<DeleteSummary> {
    let txn = db.begin().await?;

    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })?;

    let aliases = ProductAlias::delete_many()
        .filter(product_alias::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    let observations = PriceObservation::delete_many()
        .filter(price_observation::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    product.delete(&txn).await?;

    txn.commit().await?;

    info!(
        "Deleted product {} with {} aliases and {} price observations",
        product_id, aliases.rows_affected, observations.rows_affected
    );
    Ok(DeleteSummary {
        aliases_removed: aliases.rows_affected,
        observations_removed: observations.rows_affected,
    })
}

/// Folds `absorb_id` into `keep_id`.
///
/// Price observations and aliases move to the kept product, the absorbed
/// product's name becomes a global alias of the kept one (unless it is the
/// same normalized name), and the absorbed product is deleted.
///
/// # Errors
/// Returns an error if:
/// - Either product does not exist, or both ids are the same
/// - Any database statement fails
#[instrument(skip(db))]
pub async fn merge_products(
    db: &DatabaseConnection,
    keep_id: i64,
    absorb_id: i64,
) -> Result<MergeSummary> {
    if keep_id == absorb_id {
        return Err(Error::SelfMerge);
    }

    let txn = db.begin().await?;

    let kept = Product::find_by_id(keep_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            name: keep_id.to_string(),
        })?;
    let absorbed = Product::find_by_id(absorb_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            name: absorb_id.to_string(),
        })?;

    let observations = PriceObservation::update_many()
        .col_expr(price_observation::Column::ProductId, Expr::value(keep_id))
        .filter(price_observation::Column::ProductId.eq(absorb_id))
        .exec(&txn)
        .await?;
    let aliases = ProductAlias::update_many()
        .col_expr(product_alias::Column::ProductId, Expr::value(keep_id))
        .filter(product_alias::Column::ProductId.eq(absorb_id))
        .exec(&txn)
        .await?;

    if absorbed.name_norm != kept.name_norm {
        crate::core::alias::create_alias(&txn, keep_id, &absorbed.name, None).await?;
    }
    absorbed.delete(&txn).await?;

    txn.commit().await?;

    info!(
        "Merged product {} into {} ({} observations, {} aliases moved)",
        absorb_id, keep_id, observations.rows_affected, aliases.rows_affected
    );
    Ok(MergeSummary {
        kept,
        observations_moved: observations.rows_affected,
        aliases_moved: aliases.rows_affected,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{alias, ledger};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_product(&db, "", None).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyName));

        let result = create_product(&db, "   ", None).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyName));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let product = create_product(&db, "  Leche   Entera ", Some("  ".to_string())).await?;

        assert_eq!(product.name, "Leche   Entera");
        assert_eq!(product.name_norm, "leche entera");
        assert!(product.category.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_product_by_name_is_normalized() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_product(&db, "Leche").await?;

        let found = get_product_by_name(&db, "  LECHE ").await?;
        assert_eq!(found.map(|p| p.id), Some(created.id));

        assert!(get_product_by_name(&db, "Pan").await?.is_none());
        assert!(get_product_by_name(&db, "   ").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_products_ordered_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_product(&db, "Pan").await?;
        create_test_product(&db, "Aceite").await?;
        create_test_product(&db, "Leche").await?;

        let names: Vec<String> = get_all_products(&db)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Aceite", "Leche", "Pan"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Lech").await?;

        let updated =
            update_product(&db, product.id, "Leche entera", Some("Lácteos".to_string())).await?;

        assert_eq!(updated.name, "Leche entera");
        assert_eq!(updated.name_norm, "leche entera");
        assert_eq!(updated.category.as_deref(), Some("Lácteos"));

        let missing = update_product(&db, 999, "X", None).await;
        assert!(matches!(missing.unwrap_err(), Error::ProductNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_cascades() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Leche").await?;
        let other = create_test_product(&db, "Pan").await?;
        alias::create_alias(&db, product.id, "leche entera", None).await?;
        record_test_price(&db, product.id, "Lidl", 0.89, days_ago(1)).await?;
        record_test_price(&db, product.id, "Mercadona", 0.95, days_ago(2)).await?;
        record_test_price(&db, other.id, "Lidl", 1.35, days_ago(1)).await?;

        let summary = delete_product(&db, product.id).await?;
        assert_eq!(
            summary,
            DeleteSummary {
                aliases_removed: 1,
                observations_removed: 2,
            }
        );

        assert!(get_product_by_id(&db, product.id).await?.is_none());
        assert!(alias::get_aliases_for_product(&db, product.id).await?.is_empty());
        assert_eq!(ledger::price_history(&db, other.id).await?.len(), 1);

        let missing = delete_product(&db, product.id).await;
        assert!(matches!(missing.unwrap_err(), Error::ProductNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_merge_products_moves_prices_and_aliases() -> Result<()> {
        let db = setup_test_db().await?;
        let keep = create_test_product(&db, "Leche").await?;
        let absorb = create_test_product(&db, "Leche entera Hacendado").await?;
        alias::create_alias(&db, absorb.id, "LECHE ENT HCDO", Some("Mercadona")).await?;
        record_test_price(&db, absorb.id, "Mercadona", 0.95, days_ago(1)).await?;

        let summary = merge_products(&db, keep.id, absorb.id).await?;
        assert_eq!(summary.kept.id, keep.id);
        assert_eq!(summary.observations_moved, 1);
        assert_eq!(summary.aliases_moved, 1);

        assert!(get_product_by_id(&db, absorb.id).await?.is_none());
        assert_eq!(ledger::price_history(&db, keep.id).await?.len(), 1);

        let aliases: Vec<String> = alias::get_aliases_for_product(&db, keep.id)
            .await?
            .into_iter()
            .map(|a| a.alias)
            .collect();
        assert!(aliases.contains(&"LECHE ENT HCDO".to_string()));
        assert!(aliases.contains(&"Leche entera Hacendado".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_merge_products_rejects_self_and_missing() -> Result<()> {
        let db = setup_test_db().await?;
        let keep = create_test_product(&db, "Leche").await?;

        let result = merge_products(&db, keep.id, keep.id).await;
        assert!(matches!(result.unwrap_err(), Error::SelfMerge));

        let result = merge_products(&db, keep.id, 999).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { .. }));

        Ok(())
    }
}
