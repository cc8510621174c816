//! Category rule configuration loading from config.toml
//!
//! The keyword table that maps product names to spending categories can be
//! overridden in `config.toml`. Rules are evaluated in file order, so more
//! specific keywords must come first. When the file is missing the built-in
//! table in [`crate::core::category`] is used.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Ordered category rules; the first matching keyword wins
    #[serde(default)]
    pub categories: Vec<CategoryRuleConfig>,
    /// Label used when no keyword matches
    #[serde(default)]
    pub default_category: Option<String>,
}

/// Configuration for a single category rule
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryRuleConfig {
    /// Category label (e.g., "Lácteos")
    pub name: String,
    /// Keywords that select this category when found in a product name
    pub keywords: Vec<String>,
}

/// Loads category configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A rule has an empty name or no keywords
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if let Some(rule) = config
        .categories
        .iter()
        .find(|rule| rule.name.trim().is_empty() || rule.keywords.is_empty())
    {
        return Err(Error::Config {
            message: format!("Category rule '{}' needs a name and keywords", rule.name),
        });
    }

    Ok(config)
}

/// Loads category configuration from the default location (./config.toml)
///
/// A missing file is not an error and yields an empty configuration.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    if !path.exists() {
        tracing::debug!("No config.toml found, using built-in category rules.");
        return Ok(Config::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_category_config() {
        let toml_str = r#"
            default_category = "Varios"

            [[categories]]
            name = "Lácteos"
            keywords = ["leche", "yogur"]

            [[categories]]
            name = "Carne"
            keywords = ["pollo"]
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].name, "Lácteos");
        assert_eq!(config.categories[0].keywords, vec!["leche", "yogur"]);
        assert_eq!(config.categories[1].name, "Carne");
        assert_eq!(config.default_category.as_deref(), Some("Varios"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.categories.is_empty());
        assert!(config.default_category.is_none());
    }

    #[test]
    fn test_load_config_rejects_rule_without_keywords() {
        let path = std::env::temp_dir().join("basket_buddy_bad_categories.toml");
        std::fs::write(
            &path,
            "[[categories]]\nname = \"Carne\"\nkeywords = []\n",
        )
        .unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(Error::Config { .. })));
        let _ = std::fs::remove_file(&path);
    }
}
