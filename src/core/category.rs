//! Keyword-based category classification.
//!
//! One ordered rule table serves both the shopping-list grouping and the
//! dashboard, so the two can never disagree about where a product belongs.
//! Rules are evaluated top to bottom and the first keyword found in the
//! normalized product name wins; otherwise the default category is used.

use crate::config::categories::Config;
use crate::core::matching::normalize_name;

/// Category used when no keyword matches.
pub const DEFAULT_CATEGORY: &str = "Otros";

/// Built-in rules. Order matters: "pasta de dientes" must hit Higiene before
/// "pasta" hits Despensa, and "salmón" must hit Pescado before "sal".
const BUILTIN_RULES: &[(&str, &[&str])] = &[
    (
        "Lácteos",
        &[
            "leche",
            "yogur",
            "queso",
            "mantequilla",
            "nata ",
            "kéfir",
            "batido",
        ],
    ),
    (
        "Carne",
        &[
            "pollo",
            "pechuga",
            "ternera",
            "cerdo",
            "carne",
            "jamón",
            "jamon",
            "chorizo",
            "salchicha",
            "hamburguesa",
            "panceta",
            "lomo",
            "pavo",
        ],
    ),
    (
        "Pescado",
        &[
            "pescado", "merluza", "salmón", "salmon", "atún", "atun", "gamba", "bacalao",
            "sardina",
        ],
    ),
    (
        "Frutas y verduras",
        &[
            "manzana", "plátano", "platano", "naranja", "tomate", "lechuga", "patata", "cebolla",
            "zanahoria", "pimiento", "fruta", "verdura", "limón", "ajo ",
        ],
    ),
    (
        "Higiene",
        &[
            "pasta de dientes",
            "champú",
            "champu",
            "gel ",
            "desodorante",
            "compresa",
            "pañal",
            "cepillo",
        ],
    ),
    (
        "Limpieza",
        &[
            "detergente",
            "lejía",
            "lejia",
            "suavizante",
            "friegasuelos",
            "lavavajillas",
            "papel higiénico",
            "estropajo",
        ],
    ),
    (
        "Panadería",
        &["pan", "baguette", "bollo", "croissant", "magdalena", "galleta"],
    ),
    (
        "Bebidas",
        &["agua", "cerveza", "vino", "refresco", "café", "cafe", "té "],
    ),
    (
        "Despensa",
        &[
            "arroz", "pasta", "macarrones", "espagueti", "aceite", "harina", "azúcar", "azucar",
            "sal ", "legumbre", "lenteja", "garbanzo", "huevo", "conserva",
        ],
    ),
];

/// Normalizes a configured keyword, keeping one trailing space when the
/// keyword has one so it only matches whole words ("sal " but not "salmón").
fn normalize_keyword(keyword: &str) -> String {
    let mut normalized = normalize_name(keyword);
    if !normalized.is_empty() && keyword.ends_with(char::is_whitespace) {
        normalized.push(' ');
    }
    normalized
}

/// One category and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    /// Category label
    pub category: String,
    /// Normalized keywords
    pub keywords: Vec<String>,
}

/// The ordered rule table shared by every classification call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRules {
    rules: Vec<CategoryRule>,
    default_category: String,
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryRules {
    /// The built-in Spanish grocery rule table.
    #[must_use]
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(category, keywords)| CategoryRule {
                category: (*category).to_string(),
                keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            })
            .collect();
        Self {
            rules,
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// Builds the table from `config.toml`.
    ///
    /// An empty rule list keeps the built-in rules; `default_category`
    /// overrides the fallback label either way.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let mut table = if config.categories.is_empty() {
            Self::builtin()
        } else {
            Self {
                rules: config
                    .categories
                    .iter()
                    .map(|rule| CategoryRule {
                        category: rule.name.trim().to_string(),
                        keywords: rule
                            .keywords
                            .iter()
                            .map(|k| normalize_keyword(k))
                            .filter(|k| !k.is_empty())
                            .collect(),
                    })
                    .collect(),
                default_category: DEFAULT_CATEGORY.to_string(),
            }
        };

        if let Some(default) = config
            .default_category
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            table.default_category = default.to_string();
        }
        table
    }

    /// Classifies a product name. Same input, same answer.
    #[must_use]
    pub fn classify(&self, product_name: &str) -> &str {
        // Trailing space lets whole-word keywords ("té ", "sal ") match at the end.
        let name = format!("{} ", normalize_name(product_name));
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| name.contains(k.as_str())))
            .map_or(self.default_category.as_str(), |rule| rule.category.as_str())
    }

    /// Category for a product, preferring an explicit one when set.
    #[must_use]
    pub fn category_for(&self, product_name: &str, explicit: Option<&str>) -> String {
        explicit
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.classify(product_name))
            .to_string()
    }

    /// Category labels in rule order, followed by the default.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(|rule| rule.category.as_str())
            .chain(std::iter::once(self.default_category.as_str()))
    }

    /// The fallback label.
    #[must_use]
    pub fn default_category(&self) -> &str {
        &self.default_category
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::categories::{CategoryRuleConfig, load_config};
    use crate::errors::Result;

    #[test]
    fn test_classify_builtin_examples() {
        let rules = CategoryRules::builtin();
        assert_eq!(rules.classify("Leche desnatada"), "Lácteos");
        assert_eq!(rules.classify("Pechuga de pollo"), "Carne");
        assert_eq!(rules.classify("Zumo de piña"), "Otros");
    }

    #[test]
    fn test_classify_is_order_sensitive() {
        let rules = CategoryRules::builtin();
        assert_eq!(rules.classify("Pasta de dientes"), "Higiene");
        assert_eq!(rules.classify("Pasta integral"), "Despensa");
        assert_eq!(rules.classify("Salmón ahumado"), "Pescado");
        assert_eq!(rules.classify("Panceta"), "Carne");
        assert_eq!(rules.classify("Pan de molde"), "Panadería");
        assert_eq!(rules.classify("Lechuga iceberg"), "Frutas y verduras");
    }

    #[test]
    fn test_classify_is_case_and_space_insensitive() {
        let rules = CategoryRules::builtin();
        assert_eq!(rules.classify("  LECHE   entera "), "Lácteos");
        assert_eq!(rules.classify("Té"), "Bebidas");
    }

    #[test]
    fn test_classify_is_deterministic() {
        let rules = CategoryRules::builtin();
        let first = rules.classify("Queso curado").to_string();
        for _ in 0..10 {
            assert_eq!(rules.classify("Queso curado"), first);
        }
    }

    #[test]
    fn test_category_for_prefers_explicit() {
        let rules = CategoryRules::builtin();
        assert_eq!(rules.category_for("Leche", Some("Desayuno")), "Desayuno");
        assert_eq!(rules.category_for("Leche", Some("  ")), "Lácteos");
        assert_eq!(rules.category_for("Leche", None), "Lácteos");
    }

    #[test]
    fn test_from_config_replaces_rules_and_default() {
        let config = Config {
            categories: vec![CategoryRuleConfig {
                name: "Mascotas".to_string(),
                keywords: vec!["Pienso".to_string()],
            }],
            default_category: Some("Varios".to_string()),
        };
        let rules = CategoryRules::from_config(&config);

        assert_eq!(rules.classify("pienso para perro"), "Mascotas");
        assert_eq!(rules.classify("Leche"), "Varios");
        assert_eq!(rules.labels().collect::<Vec<_>>(), vec!["Mascotas", "Varios"]);
    }

    #[test]
    fn test_from_config_keeps_whole_word_keywords() {
        let config = Config {
            categories: vec![
                CategoryRuleConfig {
                    name: "Pescado".to_string(),
                    keywords: vec!["Salmón".to_string()],
                },
                CategoryRuleConfig {
                    name: "Despensa".to_string(),
                    keywords: vec!["SAL ".to_string(), "  ".to_string()],
                },
            ],
            default_category: None,
        };
        let rules = CategoryRules::from_config(&config);

        assert_eq!(rules.classify("Sal fina"), "Despensa");
        assert_eq!(rules.classify("sal"), "Despensa");
        assert_eq!(rules.classify("Salsa de tomate"), "Otros");
        assert_eq!(rules.classify("Salmón"), "Pescado");
    }

    #[test]
    fn test_shipped_config_matches_builtin() -> Result<()> {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml");
        let config = load_config(path)?;
        assert_eq!(CategoryRules::from_config(&config), CategoryRules::builtin());
        Ok(())
    }

    #[test]
    fn test_from_empty_config_keeps_builtin() {
        let rules = CategoryRules::from_config(&Config::default());
        assert_eq!(rules, CategoryRules::builtin());
        assert_eq!(rules.default_category(), DEFAULT_CATEGORY);
    }
}
