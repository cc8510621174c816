//! Shopping list Discord commands - add, show, check, remove, finalize and dictate.
//!
//! Entries are addressed by name; when several entries share a name the oldest
//! unchecked one is used.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{receipt, report, shopping_list},
        errors::{Error, Result},
        recognition,
    };
    use std::fmt::Write;

    /// Parent command for the shared shopping list.
    #[poise::command(
        slash_command,
        subcommands(
            "list_add",
            "list_show",
            "list_check",
            "list_quantity",
            "list_remove",
            "list_finalize",
            "list_dictate"
        )
    )]
    pub async fn list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Shopping list command. Available subcommands:\n\
            `/list add` - Add an item\n\
            `/list show` - Show the list by category\n\
            `/list check` - Mark an item as bought\n\
            `/list quantity` - Change how many of an item\n\
            `/list remove` - Remove an item\n\
            `/list finalize` - Clear every bought item\n\
            `/list dictate` - Add items from free text";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds an item to the shopping list.
    #[poise::command(slash_command, rename = "add")]
    pub async fn list_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product name (e.g., 'Leche entera')"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
        #[description = "How many. Defaults to 1."]
        #[min = 1]
        quantity: Option<i32>,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let entry = shopping_list::add_entry(db, &name, quantity).await?;
        let category = ctx.data().categories.classify(&entry.product_name);

        ctx.say(format!(
            "✅ Added **{}** x{} to the list ({category}).",
            entry.product_name, entry.quantity
        ))
        .await?;
        Ok(())
    }

    /// Shows the shopping list grouped by category.
    #[poise::command(slash_command, rename = "show")]
    pub async fn list_show(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = ctx.data().database()?;
        let entries = shopping_list::get_all_entries(db).await?;

        if entries.is_empty() {
            ctx.say("🛒 The list is empty. Add something with `/list add`!")
                .await?;
            return Ok(());
        }

        let (checked, pending): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(|entry| entry.is_checked);

        let mut text = String::from("🛒 **Shopping List**\n");
        for group in shopping_list::group_by_category(&pending, &ctx.data().categories) {
            let _ = writeln!(text, "\n**{}**", group.category);
            for entry in &group.entries {
                let _ = writeln!(text, "• {} x{}", entry.product_name, entry.quantity);
            }
        }
        if !checked.is_empty() {
            let _ = writeln!(text, "\n**Bought**");
            for entry in &checked {
                let _ = writeln!(text, "• ~~{} x{}~~", entry.product_name, entry.quantity);
            }
        }

        ctx.say(report::truncate_message(
            text.trim_end(),
            report::MAX_MESSAGE_LENGTH,
        ))
        .await?;
        Ok(())
    }

    /// Marks an item as bought.
    #[poise::command(slash_command, rename = "check")]
    pub async fn list_check(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to mark as bought"]
        #[autocomplete = "autocomplete::autocomplete_pending_entry"]
        item: String,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let pending = shopping_list::find_entries_by_name(db, &item)
            .await?
            .into_iter()
            .find(|entry| !entry.is_checked);

        let Some(entry) = pending else {
            ctx.say(format!("❌ '{item}' is not pending on the list."))
                .await?;
            return Ok(());
        };

        let entry = shopping_list::set_checked(db, entry.id, true).await?;
        ctx.say(format!("✅ **{}** marked as bought.", entry.product_name))
            .await?;
        Ok(())
    }

    /// Changes how many of an item are needed.
    #[poise::command(slash_command, rename = "quantity")]
    pub async fn list_quantity(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to change"]
        #[autocomplete = "autocomplete::autocomplete_pending_entry"]
        item: String,
        #[description = "New quantity"]
        #[min = 1]
        quantity: i32,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let Some(entry) = shopping_list::find_entries_by_name(db, &item)
            .await?
            .into_iter()
            .next()
        else {
            ctx.say(format!("❌ '{item}' is not on the list.")).await?;
            return Ok(());
        };

        let entry = shopping_list::update_quantity(db, entry.id, quantity).await?;
        ctx.say(format!(
            "✅ **{}** is now x{}.",
            entry.product_name, entry.quantity
        ))
        .await?;
        Ok(())
    }

    /// Removes an item from the list.
    #[poise::command(slash_command, rename = "remove")]
    pub async fn list_remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to remove"]
        #[autocomplete = "autocomplete::autocomplete_list_entry"]
        item: String,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let Some(entry) = shopping_list::find_entries_by_name(db, &item)
            .await?
            .into_iter()
            .next()
        else {
            ctx.say(format!("❌ '{item}' is not on the list.")).await?;
            return Ok(());
        };

        shopping_list::delete_entry(db, entry.id).await?;
        ctx.say(format!("🗑️ Removed **{}** from the list.", entry.product_name))
            .await?;
        Ok(())
    }

    /// Clears every bought item from the list.
    #[poise::command(slash_command, rename = "finalize")]
    pub async fn list_finalize(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = ctx.data().database()?;
        let cleared = shopping_list::finalize_purchase(db).await?;

        let message = if cleared == 0 {
            "Nothing is marked as bought yet.".to_string()
        } else {
            format!("✅ Purchase finalized, {cleared} items cleared. Use `/scan` to record the receipt prices.")
        };
        ctx.say(message).await?;
        Ok(())
    }

    /// Adds items from free text, e.g. "dos litros de leche y pan".
    #[poise::command(slash_command, rename = "dictate")]
    pub async fn list_dictate(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "What you need, in your own words"] text: String,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        ctx.defer().await?;

        let items =
            recognition::transcribe_list(ctx.data().recognizer.as_ref(), &text).await?;
        let batch = receipt::add_dictated_items(db, &items).await;

        let mut message = report::format_batch_summary(&batch, "items");
        for entry in &batch.accepted {
            let _ = write!(message, "\n• {} x{}", entry.product_name, entry.quantity);
        }
        ctx.say(report::truncate_message(&message, report::MAX_MESSAGE_LENGTH))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
