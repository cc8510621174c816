//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod price_observation;
pub mod product;
pub mod product_alias;
pub mod shopping_list_entry;

// Re-export specific types to avoid conflicts
pub use price_observation::{
    Column as PriceObservationColumn, Entity as PriceObservation, Model as PriceObservationModel,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_alias::{
    Column as ProductAliasColumn, Entity as ProductAlias, Model as ProductAliasModel,
};
pub use shopping_list_entry::{
    Column as ShoppingListEntryColumn, Entity as ShoppingListEntry,
    Model as ShoppingListEntryModel,
};
