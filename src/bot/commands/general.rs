//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    ///
    /// This is a simple health check command that doesn't require any database operations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    ///
    /// This command provides users with information about all available bot commands
    /// and their usage, helping them understand the bot's capabilities.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let mut help_text = String::from(
            "**BasketBuddy Help**\n\
        Here is a summary of all available commands for BasketBuddy.\n\n\
        **Shopping List**\n\
        • `/list add <name> [quantity]` - Adds an item to the list.\n\
        • `/list show` - Shows the list grouped by category.\n\
        • `/list check <item>` - Marks an item as bought.\n\
        • `/list quantity <item> <n>` - Changes an item's quantity.\n\
        • `/list remove <item>` - Removes an item.\n\
        • `/list finalize` - Clears every bought item.\n\
        • `/list dictate <text>` - Adds items from free text.\n\n\
        **Prices**\n\
        • `/compare` - Cheapest single store vs. cheapest split for the list.\n\
        • `/price record <product> <store> <price>` - Records a price.\n\
        • `/price current <product>` - Latest price at each store.\n\
        • `/price history <product>` - Shows recorded prices.\n\
        • `/scan <image> [store]` - Reads a receipt and records its prices.\n\
        • `/dashboard` - Spend this month vs. last month.\n\n\
        **Catalog**\n\
        • `/product <subcommand>` - Manage products (add, list, edit, link, unlink, similar, merge, delete).\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.",
        );

        let data = ctx.data();
        if !data.store.is_configured() {
            help_text.push_str("\n\n⚠️ No database is configured; lists and prices are not saved.");
        }
        if data.recognizer.is_none() {
            help_text.push_str("\n⚠️ Receipt scanning and dictation are not configured.");
        }

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
