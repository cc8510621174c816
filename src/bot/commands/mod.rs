//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Price comparison command
pub mod compare;

/// Monthly spend dashboard command
pub mod dashboard;

/// General utility commands
pub mod general;

/// Shopping list commands
pub mod list;

/// Price ledger commands
pub mod price;

/// Product catalog commands
pub mod product;

/// Receipt scanning command
pub mod scan;

// Export commands
pub use compare::*;
pub use dashboard::*;
pub use general::*;
pub use list::*;
pub use price::*;
pub use product::*;
pub use scan::*;
