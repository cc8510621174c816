//! Core business logic - framework-agnostic operations on products, prices,
//! the shopping list and the reports built from them.
//!
//! Nothing in here knows about Discord. Functions take a database connection
//! (or the [`crate::config::database::Store`]) and return structured data that
//! the bot layer formats.

/// Product aliases (alternate names, optionally store-scoped)
pub mod alias;
/// Batch outcome reporting shared by multi-record operations
pub mod batch;
/// Keyword-based category classification
pub mod category;
/// Shopping list comparison and basket optimization
pub mod comparison;
/// Monthly spend dashboard
pub mod dashboard;
/// Price observations and current-price queries
pub mod ledger;
/// Name normalization and similarity scoring
pub mod matching;
/// Currency rounding and formatting
pub mod money;
/// Product catalog management
pub mod product;
/// Receipt review and ingestion
pub mod receipt;
/// Text reports for comparisons and dashboards
pub mod report;
/// Product identity resolution
pub mod resolver;
/// Shopping list management
pub mod shopping_list;
