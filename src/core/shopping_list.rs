//! Shopping list business logic.
//!
//! Entries are free text: a name does not have to resolve to a catalog
//! product to be on the list. Unchecked entries are the input of the
//! comparison engine; checking an entry marks it as bought and
//! [`finalize_purchase`] clears every checked entry at once.

use crate::{
    core::{batch::BatchReport, category::CategoryRules, matching::normalize_name},
    entities::{ShoppingListEntry, shopping_list_entry},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument, warn};

/// Quantity used when none is given.
pub const DEFAULT_QUANTITY: i32 = 1;

/// A list entry to be added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// Free-text product name
    pub product_name: String,
    /// Quantity; [`DEFAULT_QUANTITY`] when `None`
    pub quantity: Option<i32>,
}

/// Entries sharing one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    /// Category label
    pub category: String,
    /// Entries in list order
    pub entries: Vec<shopping_list_entry::Model>,
}

fn check_quantity(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(Error::InvalidQuantity {
            quantity: i64::from(quantity),
        });
    }
    Ok(())
}

/// Adds an unchecked entry to the list.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The quantity is below one
/// - The database insert operation fails
#[instrument(skip(db))]
pub async fn add_entry<C>(
    db: &C,
    product_name: &str,
    quantity: Option<i32>,
) -> Result<shopping_list_entry::Model>
where
    C: ConnectionTrait,
{
    let product_name = product_name.trim();
    if product_name.is_empty() {
        return Err(Error::EmptyName);
    }
    let quantity = quantity.unwrap_or(DEFAULT_QUANTITY);
    check_quantity(quantity)?;

    let now = chrono::Utc::now().naive_utc();
    let entry = shopping_list_entry::ActiveModel {
        product_name: Set(product_name.to_string()),
        quantity: Set(quantity),
        is_checked: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let entry = entry.insert(db).await?;
    debug!("Added '{}' x{} to the list", entry.product_name, entry.quantity);
    Ok(entry)
}

/// Adds several entries, one outcome per item.
///
/// Invalid items are dropped and reported; storage failures are reported as
/// failed. Neither stops the batch.
pub async fn add_entries(
    db: &DatabaseConnection,
    items: &[NewEntry],
) -> BatchReport<shopping_list_entry::Model> {
    let mut report = BatchReport::default();
    for (index, item) in items.iter().enumerate() {
        match add_entry(db, &item.product_name, item.quantity).await {
            Ok(entry) => report.accepted.push(entry),
            Err(err @ (Error::EmptyName | Error::InvalidQuantity { .. })) => {
                report.drop_item(index, err.to_string());
            }
            Err(err) => {
                warn!("Failed to add list entry {}: {}", index, err);
                report.fail_item(index, err.user_message());
            }
        }
    }
    info!(
        "Added {} list entries ({} dropped, {} failed)",
        report.accepted.len(),
        report.dropped.len(),
        report.failed.len()
    );
    report
}

/// Unchecked entries, oldest first.
pub async fn get_pending_entries<C>(db: &C) -> Result<Vec<shopping_list_entry::Model>>
where
    C: ConnectionTrait,
{
    ShoppingListEntry::find()
        .filter(shopping_list_entry::Column::IsChecked.eq(false))
        .order_by_asc(shopping_list_entry::Column::CreatedAt)
        .order_by_asc(shopping_list_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every entry: unchecked first, then oldest first.
pub async fn get_all_entries<C>(db: &C) -> Result<Vec<shopping_list_entry::Model>>
where
    C: ConnectionTrait,
{
    ShoppingListEntry::find()
        .order_by_asc(shopping_list_entry::Column::IsChecked)
        .order_by_asc(shopping_list_entry::Column::CreatedAt)
        .order_by_asc(shopping_list_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Entries whose name equals `name` after normalization, unchecked first.
pub async fn find_entries_by_name<C>(db: &C, name: &str) -> Result<Vec<shopping_list_entry::Model>>
where
    C: ConnectionTrait,
{
    let name_norm = normalize_name(name);
    Ok(get_all_entries(db)
        .await?
        .into_iter()
        .filter(|entry| normalize_name(&entry.product_name) == name_norm)
        .collect())
}

async fn find_entry(db: &DatabaseConnection, entry_id: i64) -> Result<shopping_list_entry::Model> {
    ShoppingListEntry::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or(Error::EntryNotFound { id: entry_id })
}

/// Marks an entry as bought (or not).
pub async fn set_checked(
    db: &DatabaseConnection,
    entry_id: i64,
    checked: bool,
) -> Result<shopping_list_entry::Model> {
    let mut entry: shopping_list_entry::ActiveModel = find_entry(db, entry_id).await?.into();
    entry.is_checked = Set(checked);
    entry.updated_at = Set(chrono::Utc::now().naive_utc());
    entry.update(db).await.map_err(Into::into)
}

/// Changes the quantity of an entry.
///
/// # Errors
/// Returns an error if:
/// - The quantity is below one
/// - The entry does not exist
/// - The database update operation fails
pub async fn update_quantity(
    db: &DatabaseConnection,
    entry_id: i64,
    quantity: i32,
) -> Result<shopping_list_entry::Model> {
    check_quantity(quantity)?;
    let mut entry: shopping_list_entry::ActiveModel = find_entry(db, entry_id).await?.into();
    entry.quantity = Set(quantity);
    entry.updated_at = Set(chrono::Utc::now().naive_utc());
    entry.update(db).await.map_err(Into::into)
}

/// Removes an entry from the list.
pub async fn delete_entry(db: &DatabaseConnection, entry_id: i64) -> Result<()> {
    let result = ShoppingListEntry::delete_by_id(entry_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::EntryNotFound { id: entry_id });
    }
    Ok(())
}

/// Clears every checked entry and returns how many were removed.
#[instrument(skip(db))]
pub async fn finalize_purchase(db: &DatabaseConnection) -> Result<u64> {
    let result = ShoppingListEntry::delete_many()
        .filter(shopping_list_entry::Column::IsChecked.eq(true))
        .exec(db)
        .await?;
    info!("Finalized purchase, cleared {} entries", result.rows_affected);
    Ok(result.rows_affected)
}

/// Groups entries by category, in rule-table order.
///
/// Empty categories are omitted; entries keep their relative order.
#[must_use]
pub fn group_by_category(
    entries: &[shopping_list_entry::Model],
    rules: &CategoryRules,
) -> Vec<CategoryGroup> {
    let classified: Vec<(&str, &shopping_list_entry::Model)> = entries
        .iter()
        .map(|entry| (rules.classify(&entry.product_name), entry))
        .collect();

    let mut groups: Vec<CategoryGroup> = Vec::new();
    for label in rules.labels() {
        if groups.iter().any(|g| g.category == label) {
            continue;
        }
        let members: Vec<shopping_list_entry::Model> = classified
            .iter()
            .filter(|(category, _)| *category == label)
            .map(|(_, entry)| (*entry).clone())
            .collect();
        if !members.is_empty() {
            groups.push(CategoryGroup {
                category: label.to_string(),
                entries: members,
            });
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_add_entry_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = add_entry(&db, "   ", None).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyName));

        let result = add_entry(&db, "Leche", Some(0)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: 0 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_entry_defaults() -> Result<()> {
        let db = setup_test_db().await?;

        let entry = add_entry(&db, "  Leche ", None).await?;
        assert_eq!(entry.product_name, "Leche");
        assert_eq!(entry.quantity, DEFAULT_QUANTITY);
        assert!(!entry.is_checked);

        Ok(())
    }

    #[tokio::test]
    async fn test_add_entries_reports_dropped() -> Result<()> {
        let db = setup_test_db().await?;

        let report = add_entries(
            &db,
            &[
                NewEntry {
                    product_name: "Leche".to_string(),
                    quantity: Some(2),
                },
                NewEntry {
                    product_name: String::new(),
                    quantity: None,
                },
                NewEntry {
                    product_name: "Pan".to_string(),
                    quantity: Some(-1),
                },
            ],
        )
        .await;

        assert!(report.is_success());
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.dropped.len(), 2);
        assert_eq!(get_pending_entries(&db).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_check_and_finalize() -> Result<()> {
        let db = setup_test_db().await?;
        let leche = create_test_entry(&db, "Leche", 2).await?;
        let pan = create_test_entry(&db, "Pan", 1).await?;
        create_test_entry(&db, "Huevos", 12).await?;

        set_checked(&db, leche.id, true).await?;
        set_checked(&db, pan.id, true).await?;
        set_checked(&db, pan.id, false).await?;

        let pending: Vec<String> = get_pending_entries(&db)
            .await?
            .into_iter()
            .map(|e| e.product_name)
            .collect();
        assert_eq!(pending, vec!["Pan", "Huevos"]);

        let all = get_all_entries(&db).await?;
        assert_eq!(all.last().map(|e| e.id), Some(leche.id));

        assert_eq!(finalize_purchase(&db).await?, 1);
        assert_eq!(get_all_entries(&db).await?.len(), 2);
        assert_eq!(finalize_purchase(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_find_entries_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        let bought = create_test_entry(&db, "Leche", 1).await?;
        set_checked(&db, bought.id, true).await?;
        let pending = create_test_entry(&db, "leche", 2).await?;
        create_test_entry(&db, "Pan", 1).await?;

        let found = find_entries_by_name(&db, " LECHE ").await?;
        let ids: Vec<i64> = found.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![pending.id, bought.id]);
        assert!(find_entries_by_name(&db, "Huevos").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_quantity_and_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let entry = create_test_entry(&db, "Leche", 1).await?;

        let updated = update_quantity(&db, entry.id, 3).await?;
        assert_eq!(updated.quantity, 3);

        let invalid = update_quantity(&db, entry.id, 0).await;
        assert!(matches!(invalid.unwrap_err(), Error::InvalidQuantity { .. }));

        delete_entry(&db, entry.id).await?;
        let missing = delete_entry(&db, entry.id).await;
        assert!(matches!(missing.unwrap_err(), Error::EntryNotFound { .. }));
        let missing = set_checked(&db, entry.id, true).await;
        assert!(matches!(missing.unwrap_err(), Error::EntryNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_group_by_category() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_entry(&db, "Pan de molde", 1).await?;
        create_test_entry(&db, "Leche desnatada", 2).await?;
        create_test_entry(&db, "Zumo de piña", 1).await?;
        create_test_entry(&db, "Yogur natural", 4).await?;

        let entries = get_pending_entries(&db).await?;
        let groups = group_by_category(&entries, &CategoryRules::builtin());

        let summary: Vec<(String, usize)> = groups
            .iter()
            .map(|g| (g.category.clone(), g.entries.len()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Lácteos".to_string(), 2),
                ("Panadería".to_string(), 1),
                ("Otros".to_string(), 1),
            ]
        );
        assert_eq!(groups[0].entries[0].product_name, "Leche desnatada");

        Ok(())
    }
}
