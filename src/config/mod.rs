/// Database configuration, connection management and the `Store` dependency
pub mod database;

/// Category keyword rules loading from config.toml
pub mod categories;

/// Recognition service settings from environment variables
pub mod recognition;
