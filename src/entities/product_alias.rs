//! Product alias entity - An alternate name that resolves to a product.
//!
//! Aliases can be scoped to one store (`store_name`) or apply everywhere
//! (`store_name` is `None`). Alias strings are not unique: two products may
//! share a loose alias and the resolver decides between them by score.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product alias database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_aliases")]
pub struct Model {
    /// Unique identifier for the alias
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the product this alias resolves to
    pub product_id: i64,
    /// Alias as it was typed or scanned
    pub alias: String,
    /// Normalized form of `alias` used for exact lookups
    pub alias_norm: String,
    /// Store this alias applies to, `None` for every store
    pub store_name: Option<String>,
    /// When the alias was created
    pub created_at: DateTime,
}

/// Defines relationships between `ProductAlias` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each alias belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
