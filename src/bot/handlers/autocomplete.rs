//! Autocomplete handlers for Discord slash command parameters.
//!
//! This module provides autocomplete functionality for command parameters like
//! product names, shopping-list entries and store names, improving the user
//! experience by suggesting valid options as the user types.
//!
//! Without storage every handler simply returns no suggestions.

use crate::{
    bot::BotData,
    core::{ledger, product, shopping_list},
    errors::Error,
};

/// Discord autocomplete limit.
const MAX_CHOICES: usize = 25;

/// Keeps the names containing `partial` (case-insensitive), sorted and capped.
fn filter_choices(names: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .collect();
    matching.sort();
    matching.dedup();
    matching.truncate(MAX_CHOICES);
    matching
}

/// Provides autocomplete suggestions for product names.
///
/// # Arguments
/// * `ctx` - The poise context containing the store
/// * `partial` - The partial string the user has typed so far
pub async fn autocomplete_product_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Some(db) = ctx.data().store.connected() else {
        return Vec::new();
    };
    let Ok(products) = product::get_all_products(db).await else {
        return Vec::new();
    };
    filter_choices(products.into_iter().map(|p| p.name), partial)
}

/// Provides autocomplete suggestions for unchecked shopping-list entries.
pub async fn autocomplete_pending_entry(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Some(db) = ctx.data().store.connected() else {
        return Vec::new();
    };
    let Ok(entries) = shopping_list::get_pending_entries(db).await else {
        return Vec::new();
    };
    filter_choices(entries.into_iter().map(|e| e.product_name), partial)
}

/// Provides autocomplete suggestions for every shopping-list entry.
pub async fn autocomplete_list_entry(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Some(db) = ctx.data().store.connected() else {
        return Vec::new();
    };
    let Ok(entries) = shopping_list::get_all_entries(db).await else {
        return Vec::new();
    };
    filter_choices(entries.into_iter().map(|e| e.product_name), partial)
}

/// Provides autocomplete suggestions for store names seen in the ledger.
pub async fn autocomplete_store(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Some(db) = ctx.data().store.connected() else {
        return Vec::new();
    };
    let Ok(stores) = ledger::known_stores(db).await else {
        return Vec::new();
    };
    filter_choices(stores, partial)
}

/// Provides autocomplete suggestions for category labels from the shared
/// rule table.
#[allow(clippy::unused_async)]
pub async fn autocomplete_category(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    filter_choices(
        ctx.data().categories.labels().map(str::to_string),
        partial,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_choices() {
        let names = ["Leche", "leche entera", "Pan", "Leche"].map(str::to_string);
        assert_eq!(
            filter_choices(names, "LECHE"),
            vec!["Leche".to_string(), "leche entera".to_string()]
        );
    }

    #[test]
    fn test_filter_choices_caps_results() {
        let names = (0..40).map(|i| format!("Producto {i:02}"));
        let choices = filter_choices(names, "");
        assert_eq!(choices.len(), MAX_CHOICES);
        assert_eq!(choices[0], "Producto 00");
    }
}
