//! Product catalog Discord commands - add, list, edit, link, unlink, similar, merge and delete.
//!
//! Products are looked up by name or alias; the autocomplete offers canonical
//! names.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            alias,
            matching::normalize_name,
            product,
            resolver::{self, Resolution, Suggestion},
        },
        entities::product as product_entity,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use sea_orm::DatabaseConnection;
    use std::{collections::HashMap, fmt::Write};

    /// Embed descriptions are capped at 4096 characters by Discord.
    const MAX_LIST_LENGTH: usize = 3800;

    async fn lookup(db: &DatabaseConnection, name: &str) -> Result<product_entity::Model> {
        resolver::find_exact_match(db, name, None)
            .await?
            .ok_or_else(|| Error::ProductNotFound {
                name: name.to_string(),
            })
    }

    fn format_suggestions(suggestions: &[Suggestion]) -> String {
        let mut text = String::new();
        for suggestion in suggestions {
            let _ = write!(
                text,
                "\n• **{}** ({:.0}% via '{}')",
                suggestion.product.name,
                suggestion.score * 100.0,
                suggestion.matched_text
            );
        }
        text
    }

    /// Parent command for managing the product catalog.
    ///
    /// Products are the canonical identity behind every recorded price;
    /// aliases bind the names stores print on receipts to them.
    #[poise::command(
        slash_command,
        subcommands(
            "product_add",
            "product_list",
            "product_edit",
            "product_link",
            "product_unlink",
            "product_similar",
            "product_merge",
            "product_delete"
        )
    )]
    pub async fn product(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Product catalog command. Available subcommands:\n\
            `/product add` - Add a new product\n\
            `/product list` - List all products\n\
            `/product edit` - Rename or recategorize a product\n\
            `/product link` - Bind another name to a product\n\
            `/product unlink` - Remove a bound name\n\
            `/product similar` - Find likely duplicates\n\
            `/product merge` - Fold a duplicate into another product\n\
            `/product delete` - Delete a product and its prices";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds a product to the catalog.
    ///
    /// When similar products already exist they are listed instead, unless
    /// `force` is set.
    #[poise::command(slash_command, rename = "add")]
    pub async fn product_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Canonical name (e.g., 'Leche entera')"] name: String,
        #[description = "Spending category. Inferred from the name if omitted."]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "Create even if similar products exist"] force: Option<bool>,
    ) -> Result<()> {
        let db = ctx.data().database()?;

        match resolver::resolve(db, &name, None).await? {
            Resolution::Exact(existing) => {
                ctx.say(format!(
                    "⚠️ '{name}' already resolves to **{}**.",
                    existing.name
                ))
                .await?;
                return Ok(());
            }
            Resolution::Suggestions(suggestions) if !force.unwrap_or(false) => {
                ctx.say(format!(
                    "🤔 Similar products already exist:{}\n\
                     Use `/product link` to bind '{name}' to one of them, or repeat with `force: true`.",
                    format_suggestions(&suggestions)
                ))
                .await?;
                return Ok(());
            }
            Resolution::Suggestions(_) | Resolution::NoMatch => {}
        }

        let category = ctx
            .data()
            .categories
            .category_for(&name, category.as_deref());
        let created = product::create_product(db, &name, Some(category.clone())).await?;

        ctx.say(format!(
            "✅ Product **{}** added to category '{category}'.",
            created.name
        ))
        .await?;
        Ok(())
    }

    /// Lists every product with its category and bound names.
    #[poise::command(slash_command, rename = "list")]
    pub async fn product_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = ctx.data().database()?;
        let products = product::get_all_products(db).await?;

        if products.is_empty() {
            ctx.say("No products yet. Use `/product add` or scan a receipt with `/scan`!")
                .await?;
            return Ok(());
        }

        let mut aliases_by_product: HashMap<i64, Vec<String>> = HashMap::new();
        for a in alias::get_all_aliases(db).await? {
            let label = match &a.store_name {
                Some(store) => format!("{} @{store}", a.alias),
                None => a.alias,
            };
            aliases_by_product.entry(a.product_id).or_default().push(label);
        }

        let mut description = String::new();
        let mut shown = 0;
        for prod in &products {
            let category = ctx
                .data()
                .categories
                .category_for(&prod.name, prod.category.as_deref());
            let mut line = format!("• **{}** ({category})", prod.name);
            if let Some(names) = aliases_by_product.get(&prod.id) {
                let _ = write!(line, " aka {}", names.join(", "));
            }
            if description.len() + line.len() > MAX_LIST_LENGTH {
                break;
            }
            let _ = writeln!(description, "{line}");
            shown += 1;
        }
        if shown < products.len() {
            let _ = write!(description, "…and {} more", products.len() - shown);
        }

        let list_embed = serenity::CreateEmbed::default()
            .title("**Product Catalog**")
            .description(description)
            .color(0x0058_65F2) // Discord purple
            .footer(serenity::CreateEmbedFooter::new(format!(
                "{} product{}",
                products.len(),
                if products.len() == 1 { "" } else { "s" }
            )));

        ctx.send(poise::CreateReply::default().embed(list_embed))
            .await?;
        Ok(())
    }

    /// Renames a product or changes its category.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn product_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to edit"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
        #[description = "New name"] new_name: Option<String>,
        #[description = "New category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let existing = lookup(db, &name).await?;

        if new_name.is_none() && category.is_none() {
            ctx.say("ℹ️ Nothing to change. Give a new name and/or a category.")
                .await?;
            return Ok(());
        }

        let target_name = new_name.unwrap_or_else(|| existing.name.clone());
        let target_category = category.or_else(|| existing.category.clone());
        let updated = product::update_product(db, existing.id, &target_name, target_category).await?;

        if normalize_name(&existing.name) != updated.name_norm {
            alias::create_alias(db, updated.id, &existing.name, None).await?;
        }

        let category = ctx
            .data()
            .categories
            .category_for(&updated.name, updated.category.as_deref());
        ctx.say(format!(
            "✅ Product updated: **{}** ({category}).",
            updated.name
        ))
        .await?;
        Ok(())
    }

    /// Binds another name (e.g. a receipt label) to an existing product.
    #[poise::command(slash_command, rename = "link")]
    pub async fn product_link(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Existing product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
        #[description = "Name to bind (e.g., 'LECHE ENT. HACENDADO')"] alias: String,
        #[description = "Only bind it at this store"]
        #[autocomplete = "autocomplete::autocomplete_store"]
        store: Option<String>,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let target = lookup(db, &name).await?;
        let linked = resolver::link_to_product(db, target.id, &alias, store.as_deref()).await?;

        let scope = linked
            .store_name
            .as_deref()
            .map_or_else(|| "everywhere".to_string(), |s| format!("at {s}"));
        ctx.say(format!(
            "🔗 '{}' now resolves to **{}** {scope}.",
            linked.alias, target.name
        ))
        .await?;
        Ok(())
    }

    /// Removes a bound name from a product.
    #[poise::command(slash_command, rename = "unlink")]
    pub async fn product_unlink(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product the name is bound to"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
        #[description = "Bound name to remove"] alias: String,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let target = lookup(db, &name).await?;
        let alias_norm = normalize_name(&alias);

        let mut removed = 0;
        for a in alias::get_aliases_for_product(db, target.id).await? {
            if a.alias_norm == alias_norm && alias::delete_alias(db, a.id).await? {
                removed += 1;
            }
        }

        let message = if removed == 0 {
            format!("❌ '{alias}' is not bound to **{}**.", target.name)
        } else {
            format!("✅ '{alias}' no longer resolves to **{}**.", target.name)
        };
        ctx.say(message).await?;
        Ok(())
    }

    /// Lists products that look like duplicates of the given one.
    #[poise::command(slash_command, rename = "similar")]
    pub async fn product_similar(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to check"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let target = lookup(db, &name).await?;
        let similar = resolver::find_similar_products(db, target.id).await?;

        let message = if similar.is_empty() {
            format!("✅ Nothing similar to **{}**.", target.name)
        } else {
            format!(
                "Products similar to **{}**:{}\nUse `/product merge` to fold a duplicate in.",
                target.name,
                format_suggestions(&similar)
            )
        };
        ctx.say(message).await?;
        Ok(())
    }

    /// Folds a duplicate product into another, keeping all its prices.
    #[poise::command(slash_command, rename = "merge")]
    pub async fn product_merge(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to keep"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        keep: String,
        #[description = "Duplicate to fold in and delete"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        absorb: String,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let kept = lookup(db, &keep).await?;
        let absorbed = lookup(db, &absorb).await?;

        if kept.id == absorbed.id {
            ctx.say("❌ Pick two different products to merge.").await?;
            return Ok(());
        }

        let summary = product::merge_products(db, kept.id, absorbed.id).await?;
        ctx.say(format!(
            "✅ Merged **{}** into **{}** ({} prices, {} names moved).",
            absorbed.name, summary.kept.name, summary.observations_moved, summary.aliases_moved
        ))
        .await?;
        Ok(())
    }

    /// Deletes a product together with its bound names and prices.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn product_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to delete"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
    ) -> Result<()> {
        let db = ctx.data().database()?;
        let target = lookup(db, &name).await?;
        let summary = product::delete_product(db, target.id).await?;

        ctx.say(format!(
            "🗑️ Deleted **{}** with {} prices and {} bound names.",
            target.name, summary.observations_removed, summary.aliases_removed
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
