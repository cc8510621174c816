use basket_buddy::{
    bot::{self, BotData},
    config,
    core::category::CategoryRules,
    errors::{Error, Result},
    recognition::gemini::GeminiClient,
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Category rules from config.toml, or the built-in table
    let category_config = config::categories::load_default_config()
        .inspect_err(|e| error!("Failed to load config.toml: {}", e))?;
    let categories = CategoryRules::from_config(&category_config);
    info!("Loaded {} category labels.", categories.labels().count());

    // 4. Storage is optional
    let store = config::database::connect_store()
        .await
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Recognition is optional too
    let recognizer = config::recognition::load_recognition_settings().map(GeminiClient::new);
    match &recognizer {
        Some(client) => info!("Recognition enabled with model {}.", client.model()),
        None => warn!("GEMINI_API_KEY is not set; scanning and dictation are disabled."),
    }

    // 6. Run the bot
    // DISCORD_BOT_TOKEN is read directly before use, not stored in BotData
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(&token, BotData::new(store, categories, recognizer)).await
}
