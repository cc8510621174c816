//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the BasketBuddy application,
//! including all slash commands, autocomplete handlers, and bot context management.

/// Discord command implementations (list, compare, product, price, scan, dashboard, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::database::Store,
    core::category::CategoryRules,
    errors::{Error, Result},
    recognition::gemini::GeminiClient,
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
/// This structure holds the store, the category rule table and the optional
/// recognition client that commands need to access.
pub struct BotData {
    /// Persistent store; may be unconfigured
    pub store: Store,
    /// Shared category rule table
    pub categories: CategoryRules,
    /// Receipt/dictation recognition client, if configured
    pub recognizer: Option<GeminiClient>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    /// This is typically called during bot initialization to set up the
    /// shared context for all commands.
    #[must_use]
    pub const fn new(
        store: Store,
        categories: CategoryRules,
        recognizer: Option<GeminiClient>,
    ) -> Self {
        Self {
            store,
            categories,
            recognizer,
        }
    }

    /// The database connection, or [`Error::NotConfigured`].
    pub fn database(&self) -> Result<&DatabaseConnection> {
        self.store.connection()
    }
}

/// Context type shared by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            let message = format!("❌ {}", error.user_message());
            if let Err(e) = ctx.say(message).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// All slash commands, in registration order.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::ping(),
        commands::help(),
        commands::list(),
        commands::compare(),
        commands::product(),
        commands::price(),
        commands::scan(),
        commands::dashboard(),
    ]
}

/// Builds the poise framework and runs the Discord client until it stops.
#[instrument(skip(token, data))]
pub async fn run_bot(token: &str, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;
