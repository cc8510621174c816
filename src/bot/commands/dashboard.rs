//! Dashboard Discord command - this month's spend against last month's.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::{dashboard, report},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Shows recorded spend for this month and last month, by category.
    #[poise::command(slash_command, prefix_command)]
    pub async fn dashboard(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let summary = dashboard::dashboard_summary(&data.store, &data.categories).await?;

        if summary.current_month_observations == 0 && summary.previous_month_observations == 0 {
            ctx.say("📊 No prices recorded in the last two months. Scan a receipt with `/scan`!")
                .await?;
            return Ok(());
        }

        let now = chrono::Local::now();
        let embed = serenity::CreateEmbed::default()
            .title("📊 Spending Dashboard")
            .description(report::format_dashboard(&summary))
            .color(0x0058_65F2) // Discord purple
            .footer(serenity::CreateEmbedFooter::new(format!(
                "As of {}",
                now.format("%Y-%m-%d")
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
