//! Unified error types for `BasketBuddy`.
//!
//! Every fallible operation in the crate returns [`Result`]. "Not found" is
//! deliberately absent for lookups: those return `Option` or empty collections.
//! The variants that remain describe storage/AI failures, rejected input and
//! missing configuration.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// A collaborator (storage, recognition service) is not configured.
    #[error("{service} is not configured")]
    NotConfigured {
        /// Name of the missing service
        service: String,
    },

    /// Storage layer failure.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A price that is zero, negative or not finite.
    #[error("Invalid price: {price}")]
    InvalidPrice {
        /// The rejected price
        price: f64,
    },

    /// A recognized line whose price could not be read.
    #[error("Could not read the price of '{name}'")]
    UnreadablePrice {
        /// Name printed on the line
        name: String,
    },

    /// A quantity below one.
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i64,
    },

    /// A product, alias or list entry name that is empty after trimming.
    #[error("Name cannot be empty")]
    EmptyName,

    /// A date that is not `YYYY-MM-DD`.
    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input
        value: String,
    },

    /// A price observation without a store.
    #[error("Store name cannot be empty")]
    EmptyStoreName,

    /// An explicit edit targeted a product that does not exist.
    #[error("Product not found: {name}")]
    ProductNotFound {
        /// Name or id of the product
        name: String,
    },

    /// A merge whose kept and absorbed product are the same.
    #[error("Cannot merge a product into itself")]
    SelfMerge,

    /// An explicit edit targeted a list entry that does not exist.
    #[error("Shopping list entry not found: {id}")]
    EntryNotFound {
        /// Entry id
        id: i64,
    },

    /// An explicit edit targeted a price observation that does not exist.
    #[error("Price observation not found: {id}")]
    ObservationNotFound {
        /// Observation id
        id: i64,
    },

    /// The recognition service rejected the request because of rate limiting.
    #[error("The recognition service rate limit was reached, try again in a minute")]
    RateLimited,

    /// The recognition service rejected the API key.
    #[error("The recognition service rejected the configured API key")]
    InvalidCredentials,

    /// The recognition service returned no usable products.
    #[error("No products were detected in the input")]
    NoDetection,

    /// The recognition service answered with something that is not the expected shape.
    #[error("Could not decode recognition response: {message}")]
    Decode {
        /// What went wrong while decoding
        message: String,
    },

    /// Any other failure reported by an upstream collaborator.
    #[error("Upstream service error: {message}")]
    Upstream {
        /// Message reported by the collaborator
        message: String,
    },

    /// Transport failure talking to the recognition service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise failure.
    #[error("Discord framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Message suitable for showing to a user.
    ///
    /// Anticipated failures keep their own message; anything else collapses
    /// into a generic fallback so internal details are not leaked.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConfigured { .. }
            | Self::InvalidPrice { .. }
            | Self::UnreadablePrice { .. }
            | Self::InvalidQuantity { .. }
            | Self::EmptyName
            | Self::EmptyStoreName
            | Self::InvalidDate { .. }
            | Self::ProductNotFound { .. }
            | Self::SelfMerge
            | Self::EntryNotFound { .. }
            | Self::ObservationNotFound { .. }
            | Self::RateLimited
            | Self::InvalidCredentials
            | Self::NoDetection => self.to_string(),
            Self::Database(_) => "The database could not be reached, try again later".to_string(),
            _ => "Something went wrong, try again later".to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
