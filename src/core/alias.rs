//! Alias business logic - alternate names bound to one product.
//!
//! Aliases are how "LECHE ENT. HCDO" on a Mercadona receipt and "leche
//! entera" typed by hand end up on the same product. An alias can be limited
//! to one store; `None` means it applies everywhere.

use crate::{
    core::matching::normalize_name,
    entities::{Product, ProductAlias, product_alias},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, instrument};

/// Attaches an alias to an existing product.
///
/// The alias and store are trimmed; a blank store means "every store". If an
/// identical alias (same normalized text, same store scope) already exists
/// for the product it is returned instead of creating a duplicate.
///
/// # Errors
/// Returns an error if:
/// - The alias is empty or whitespace-only
/// - The product does not exist
/// - The database operation fails
#[instrument(skip(db))]
pub async fn create_alias<C>(
    db: &C,
    product_id: i64,
    alias: &str,
    store_name: Option<&str>,
) -> Result<product_alias::Model>
where
    C: ConnectionTrait,
{
    let alias = alias.trim();
    if alias.is_empty() {
        return Err(Error::EmptyName);
    }
    let store_name = store_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    if Product::find_by_id(product_id).one(db).await?.is_none() {
        return Err(Error::ProductNotFound {
            name: product_id.to_string(),
        });
    }

    let alias_norm = normalize_name(alias);
    let existing = get_aliases_for_product(db, product_id)
        .await?
        .into_iter()
        .find(|a| {
            a.alias_norm == alias_norm
                && a.store_name.as_deref().map(normalize_name)
                    == store_name.as_deref().map(normalize_name)
        });
    if let Some(existing) = existing {
        debug!("Alias '{}' already bound to product {}", alias, product_id);
        return Ok(existing);
    }

    let model = product_alias::ActiveModel {
        product_id: Set(product_id),
        alias: Set(alias.to_string()),
        alias_norm: Set(alias_norm),
        store_name: Set(store_name),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// All aliases of a product, oldest first.
pub async fn get_aliases_for_product<C>(
    db: &C,
    product_id: i64,
) -> Result<Vec<product_alias::Model>>
where
    C: ConnectionTrait,
{
    ProductAlias::find()
        .filter(product_alias::Column::ProductId.eq(product_id))
        .order_by_asc(product_alias::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every alias in the catalog.
pub async fn get_all_aliases<C>(db: &C) -> Result<Vec<product_alias::Model>>
where
    C: ConnectionTrait,
{
    ProductAlias::find()
        .order_by_asc(product_alias::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Aliases whose normalized text equals the normalized `alias`.
pub async fn find_aliases_by_text<C>(db: &C, alias: &str) -> Result<Vec<product_alias::Model>>
where
    C: ConnectionTrait,
{
    let alias_norm = normalize_name(alias);
    if alias_norm.is_empty() {
        return Ok(Vec::new());
    }
    ProductAlias::find()
        .filter(product_alias::Column::AliasNorm.eq(alias_norm))
        .order_by_asc(product_alias::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Removes an alias. Returns whether a row was deleted.
pub async fn delete_alias(db: &DatabaseConnection, alias_id: i64) -> Result<bool> {
    let result = ProductAlias::delete_by_id(alias_id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_alias_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Leche").await?;

        let alias = create_alias(&db, product.id, "  Leche Entera ", Some(" Lidl ")).await?;
        assert_eq!(alias.alias, "Leche Entera");
        assert_eq!(alias.alias_norm, "leche entera");
        assert_eq!(alias.store_name.as_deref(), Some("Lidl"));

        let global = create_alias(&db, product.id, "leche ent", Some("   ")).await?;
        assert!(global.store_name.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_alias_deduplicates() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Leche").await?;

        let first = create_alias(&db, product.id, "leche entera", None).await?;
        let second = create_alias(&db, product.id, "LECHE  ENTERA", None).await?;
        assert_eq!(first.id, second.id);

        // Different store scope is a different alias
        let scoped = create_alias(&db, product.id, "leche entera", Some("Lidl")).await?;
        assert_ne!(first.id, scoped.id);

        assert_eq!(get_aliases_for_product(&db, product.id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_alias_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Leche").await?;

        let result = create_alias(&db, product.id, "  ", None).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyName));

        let result = create_alias(&db, 999, "leche", None).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_find_and_delete_alias() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Leche").await?;
        let alias = create_alias(&db, product.id, "Leche entera", None).await?;

        let found = find_aliases_by_text(&db, "LECHE entera").await?;
        assert_eq!(found.len(), 1);
        assert!(find_aliases_by_text(&db, "").await?.is_empty());

        assert!(delete_alias(&db, alias.id).await?);
        assert!(!delete_alias(&db, alias.id).await?);
        assert!(get_all_aliases(&db).await?.is_empty());

        Ok(())
    }
}
