//! Shopping list entry entity - One line of the household shopping list.
//!
//! The product name is free text and does not have to resolve to a catalog
//! product until the list is compared.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shopping list entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shopping_list_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name as typed or dictated
    pub product_name: String,
    /// How many units to buy, at least 1
    pub quantity: i32,
    /// Whether the item has already been picked up
    pub is_checked: bool,
    /// When the entry was created
    pub created_at: DateTime,
    /// When the entry was last modified
    pub updated_at: DateTime,
}

/// `ShoppingListEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
