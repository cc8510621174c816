//! Comparison Discord command - prices the pending list across stores.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::{
            comparison::{self, ComparisonOutcome},
            report,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Embed footers are capped at 2048 characters by Discord.
    const MAX_FOOTER_LENGTH: usize = 2000;

    /// Compares the pending list: cheapest single store vs. cheapest split.
    #[poise::command(slash_command, prefix_command)]
    pub async fn compare(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;

        let result = match comparison::compare_pending_list(&ctx.data().store).await? {
            ComparisonOutcome::EmptyList => {
                ctx.say("🛒 Nothing pending on the list. Add items with `/list add` first.")
                    .await?;
                return Ok(());
            }
            ComparisonOutcome::Compared(result) => result,
        };

        let without_data: Vec<&str> = result
            .entries_without_data()
            .map(|b| b.product_name.as_str())
            .collect();
        let footer = if without_data.is_empty() {
            format!("{} items compared", result.products.len())
        } else {
            report::truncate_message(
                &format!("No prices yet for: {}", without_data.join(", ")),
                MAX_FOOTER_LENGTH,
            )
        };

        let embed = serenity::CreateEmbed::default()
            .title("🧾 Price Comparison")
            .description(report::format_comparison(
                &result,
                report::MAX_MESSAGE_LENGTH,
            ))
            .color(0x0034_98DB) // Blue color
            .footer(serenity::CreateEmbedFooter::new(footer));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
