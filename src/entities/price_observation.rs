//! Price observation entity - One recorded (product, store, price, date) fact.
//!
//! Observations accumulate over time. The current price of a product at a
//! store is the observation with the latest `date_recorded`, ties going to the
//! most recently inserted row (highest `id`).
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price observation database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_observations")]
pub struct Model {
    /// Unique identifier, also the insertion order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the observed product
    pub product_id: i64,
    /// Free-text store name (e.g., "Mercadona")
    pub store_name: String,
    /// Observed shelf price, always positive
    pub price: f64,
    /// Optional price per unit (kg, litre...) when the label shows one
    pub unit_price: Option<f64>,
    /// Day the price was seen
    pub date_recorded: Date,
    /// When the observation was stored
    pub created_at: DateTime,
}

/// Defines relationships between `PriceObservation` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each observation belongs to one product
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
