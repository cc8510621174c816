//! Receipt scanning Discord command.
//!
//! A photographed receipt is read by the recognition service and every
//! valid line is recorded in the price ledger. With `preview` nothing is
//! written; each line is shown with what it would resolve to.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            ledger,
            money::format_currency,
            receipt::{self, ReviewItem},
            report,
            resolver::Resolution,
        },
        errors::{Error, Result},
        recognition,
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;
    use tracing::info;

    /// Images larger than this are rejected before download.
    const MAX_IMAGE_BYTES: u32 = 10 * 1024 * 1024;
    const DEFAULT_MIME_TYPE: &str = "image/jpeg";

    fn format_review_item(review: &ReviewItem) -> String {
        let store = review.store_name.as_deref().unwrap_or("no store");
        let target = match &review.resolution {
            Resolution::Exact(product) => format!("→ **{}**", product.name),
            Resolution::Suggestions(suggestions) => {
                let names: Vec<&str> = suggestions
                    .iter()
                    .map(|s| s.product.name.as_str())
                    .collect();
                format!("→ new? similar: {}", names.join(", "))
            }
            Resolution::NoMatch => "→ new product".to_string(),
        };
        let price = review
            .item
            .price
            .map_or_else(|| "price unreadable".to_string(), format_currency);
        format!("• {} {price} ({store}) {target}", review.item.name)
    }

    /// Reads a receipt photo and records its prices.
    #[poise::command(slash_command)]
    pub async fn scan(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Photo of the receipt"] image: serenity::Attachment,
        #[description = "Store, if the receipt does not show it"]
        #[autocomplete = "autocomplete::autocomplete_store"]
        store: Option<String>,
        #[description = "Purchase day as YYYY-MM-DD. Defaults to today."] date: Option<String>,
        #[description = "Only show what would be recorded"] preview: Option<bool>,
    ) -> Result<()> {
        let data = ctx.data();
        let db = data.database()?;

        if image.size > MAX_IMAGE_BYTES {
            ctx.say("❌ That image is too large, keep it under 10 MB.")
                .await?;
            return Ok(());
        }
        let date_recorded = match date {
            Some(text) => ledger::parse_date(&text)?,
            None => chrono::Local::now().date_naive(),
        };

        ctx.defer().await?;

        let bytes = image.download().await?;
        let mime_type = image.content_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE);
        let recognized =
            recognition::scan_receipt(data.recognizer.as_ref(), &bytes, mime_type).await?;
        info!(
            "Recognized {} lines from '{}'",
            recognized.items.len(),
            image.filename
        );

        if preview.unwrap_or(false) {
            let reviews = receipt::review_receipt(db, &recognized, store.as_deref()).await?;
            let mut text = format!(
                "🔍 **Receipt preview** ({}), nothing saved:",
                recognized.store_name.as_deref().unwrap_or("unknown store")
            );
            for review in &reviews {
                let _ = write!(text, "\n{}", format_review_item(review));
            }
            ctx.say(report::truncate_message(&text, report::MAX_MESSAGE_LENGTH))
                .await?;
            return Ok(());
        }

        let batch = receipt::ingest_receipt(
            db,
            &data.categories,
            &recognized,
            store.as_deref(),
            date_recorded,
        )
        .await;

        let mut text = report::format_batch_summary(&batch, "prices");
        for ingested in &batch.accepted {
            let _ = write!(
                text,
                "\n• {} {} at {}{}",
                ingested.product.name,
                format_currency(ingested.observation.price),
                ingested.observation.store_name,
                if ingested.created_product { " 🆕" } else { "" }
            );
        }
        if batch.accepted.iter().any(|i| i.created_product) {
            text.push_str("\n🆕 New products: check `/product similar` for duplicates.");
        }

        ctx.say(report::truncate_message(&text, report::MAX_MESSAGE_LENGTH))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
