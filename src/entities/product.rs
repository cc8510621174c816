//! Product entity - The canonical identity of a shopping item.
//!
//! A product is independent of any store's label for it. Store-specific or
//! alternative spellings are attached as aliases, and every recorded price
//! references exactly one product.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the product (e.g., "Leche entera")
    pub name: String,
    /// Normalized form of `name` used for exact lookups
    pub name_norm: String,
    /// Explicit spending category; inferred from the name when absent
    pub category: Option<String>,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many aliases
    #[sea_orm(has_many = "super::product_alias::Entity")]
    Aliases,
    /// One product has many price observations
    #[sea_orm(has_many = "super::price_observation::Entity")]
    PriceObservations,
}

impl Related<super::product_alias::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Aliases.def()
    }
}

impl Related<super::price_observation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceObservations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
