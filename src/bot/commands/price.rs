//! Price Discord commands - record, current, history, fix and delete.
//!
//! These commands work on the price ledger directly. Receipts go through
//! `/scan` instead.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            ledger::{self, NewObservation},
            money::format_currency,
            report, resolver,
        },
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// History lines shown at most.
    const HISTORY_LIMIT: usize = 20;

    /// Parent command for the price ledger.
    #[poise::command(
        slash_command,
        subcommands(
            "price_record",
            "price_current",
            "price_history",
            "price_fix",
            "price_delete"
        )
    )]
    pub async fn price(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Price ledger command. Available subcommands:\n\
            `/price record` - Record a price seen at a store\n\
            `/price current` - Latest price of a product at each store\n\
            `/price history` - Every recorded price of a product\n\
            `/price fix` - Correct a recorded price\n\
            `/price delete` - Delete a recorded price";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Records a price seen at a store.
    #[poise::command(slash_command, rename = "record")]
    pub async fn price_record(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product: String,
        #[description = "Store (e.g., 'Mercadona')"]
        #[autocomplete = "autocomplete::autocomplete_store"]
        store: String,
        #[description = "Shelf price (e.g., 1.20)"] price: f64,
        #[description = "Price per kg or litre from the label"] unit_price: Option<f64>,
        #[description = "Day seen as YYYY-MM-DD. Defaults to today."] date: Option<String>,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let target = resolver::find_exact_match(db, &product, Some(&store))
            .await?
            .ok_or_else(|| Error::ProductNotFound {
                name: product.clone(),
            })?;
        let date_recorded = match date {
            Some(text) => ledger::parse_date(&text)?,
            None => chrono::Local::now().date_naive(),
        };

        let stored = ledger::record_observation(
            db,
            &NewObservation {
                product_id: target.id,
                store_name: store,
                price,
                unit_price,
                date_recorded,
            },
        )
        .await?;

        ctx.say(format!(
            "✅ Recorded **{}** at {} for {} on {}.",
            target.name,
            stored.store_name,
            format_currency(stored.price),
            stored.date_recorded.format("%Y-%m-%d")
        ))
        .await?;
        Ok(())
    }

    /// Shows the latest price of a product at each store.
    #[poise::command(slash_command, rename = "current")]
    pub async fn price_current(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product: String,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let target = resolver::find_exact_match(db, &product, None)
            .await?
            .ok_or_else(|| Error::ProductNotFound {
                name: product.clone(),
            })?;

        let current = ledger::current_prices_by_store(db, &[target.id]).await?;
        let Some(by_store) = current.get(&target.id) else {
            ctx.say(format!("No prices recorded for **{}** yet.", target.name))
                .await?;
            return Ok(());
        };
        let lowest = ledger::min_historical_unit_price(db, &[target.id])
            .await?
            .get(&target.id)
            .copied();

        let mut text = format!("**{}** current prices:", target.name);
        for price in by_store.values() {
            let unit = price
                .unit_price
                .map(|u| format!(" ({}/unit)", format_currency(u)))
                .unwrap_or_default();
            let _ = write!(
                text,
                "\n• {}: {}{unit} since {}",
                price.store_name,
                format_currency(price.price),
                price.date_recorded.format("%Y-%m-%d")
            );
        }
        if let Some(lowest) = lowest {
            let _ = write!(text, "\nLowest ever: {}", format_currency(lowest));
        }

        ctx.say(report::truncate_message(&text, report::MAX_MESSAGE_LENGTH))
            .await?;
        Ok(())
    }

    /// Shows the recorded prices of a product, newest first.
    #[poise::command(slash_command, rename = "history")]
    pub async fn price_history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product: String,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let target = resolver::find_exact_match(db, &product, None)
            .await?
            .ok_or_else(|| Error::ProductNotFound {
                name: product.clone(),
            })?;
        let history = ledger::price_history(db, target.id).await?;

        if history.is_empty() {
            ctx.say(format!("No prices recorded for **{}** yet.", target.name))
                .await?;
            return Ok(());
        }

        let mut text = format!("**{}** price history:\n```\n", target.name);
        for observation in history.iter().take(HISTORY_LIMIT) {
            let _ = writeln!(text, "{}", report::format_observation(observation));
        }
        text.push_str("```");
        if history.len() > HISTORY_LIMIT {
            let _ = write!(text, "…and {} older", history.len() - HISTORY_LIMIT);
        }

        ctx.say(text).await?;
        Ok(())
    }

    /// Corrects a recorded price. The id is shown by `/price history`.
    #[poise::command(slash_command, rename = "fix")]
    pub async fn price_fix(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Price id (the #number in the history)"] id: i64,
        #[description = "Correct shelf price"] price: f64,
        #[description = "Correct price per kg or litre"] unit_price: Option<f64>,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let updated = ledger::update_observation(db, id, price, unit_price).await?;
        ctx.say(format!(
            "✅ Corrected: {}",
            report::format_observation(&updated)
        ))
        .await?;
        Ok(())
    }

    /// Deletes a recorded price. The id is shown by `/price history`.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn price_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Price id (the #number in the history)"] id: i64,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        ledger::delete_observation(db, id).await?;
        ctx.say(format!("🗑️ Price #{id} deleted.")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
