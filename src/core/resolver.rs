//! Product identity resolution.
//!
//! Maps a free-text name (typed, dictated or scanned) to a catalog product.
//! Resolution is two-tiered:
//!
//! 1. **Exact**: an alias with the same normalized text (store-scoped aliases
//!    first, then global ones), then a product with the same normalized name.
//!    An exact hit skips fuzzy scoring entirely.
//! 2. **Fuzzy**: every product name and alias is scored against the
//!    candidate; scores at or above [`ACCEPTANCE_THRESHOLD`] are kept, collapsed
//!    per product (best score wins), sorted by score and cut to
//!    [`MAX_SUGGESTIONS`].
//!
//! "No match" is a normal outcome, never an error. Only storage failures are
//! returned as `Err`.

use crate::{
    core::{
        alias, product,
        matching::{
            ACCEPTANCE_THRESHOLD, MAX_SUGGESTIONS, OverlapScorer, SimilarityScorer,
            first_significant_word, normalize_name,
        },
    },
    entities::{product as product_entity, product_alias},
    errors::Result,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// A fuzzy match candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    /// The suggested product
    pub product: product_entity::Model,
    /// Similarity in `0.0..=1.0`
    pub score: f64,
    /// The name or alias that produced the score
    pub matched_text: String,
}

/// Result of resolving a free-text name.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A product the system is confident about
    Exact(product_entity::Model),
    /// No exact match, but similar products exist (best first)
    Suggestions(Vec<Suggestion>),
    /// Nothing similar; treat the name as a new product
    NoMatch,
}

/// In-memory snapshot of products and aliases used for scoring.
///
/// Loaded once per resolution or comparison run.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// All products
    pub products: Vec<product_entity::Model>,
    /// All aliases
    pub aliases: Vec<product_alias::Model>,
}

impl Catalog {
    /// Loads every product and alias.
    pub async fn load<C>(db: &C) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        Ok(Self {
            products: product::get_all_products(db).await?,
            aliases: alias::get_all_aliases(db).await?,
        })
    }

    fn product(&self, product_id: i64) -> Option<&product_entity::Model> {
        self.products.iter().find(|p| p.id == product_id)
    }

    /// Exact resolution against the snapshot.
    ///
    /// With a store context, aliases scoped to that store win over global
    /// aliases and aliases scoped to other stores are ignored. Without one,
    /// global aliases win over store-scoped ones.
    #[must_use]
    pub fn find_exact(&self, name: &str, store_name: Option<&str>) -> Option<&product_entity::Model> {
        let name_norm = normalize_name(name);
        if name_norm.is_empty() {
            return None;
        }
        let candidates: Vec<&product_alias::Model> = self
            .aliases
            .iter()
            .filter(|a| a.alias_norm == name_norm)
            .collect();

        pick_alias(&candidates, store_name)
            .and_then(|a| self.product(a.product_id))
            .or_else(|| self.products.iter().find(|p| p.name_norm == name_norm))
    }

    /// Fuzzy suggestions for `name`, best first.
    pub fn suggest<S>(&self, name: &str, scorer: &S) -> Vec<Suggestion>
    where
        S: SimilarityScorer + ?Sized,
    {
        let name_norm = normalize_name(name);
        if name_norm.is_empty() {
            return Vec::new();
        }

        let mut best: HashMap<i64, (f64, String)> = HashMap::new();
        let mut consider = |product_id: i64, target_norm: &str, text: &str| {
            let score = scorer.score(&name_norm, target_norm);
            if score < ACCEPTANCE_THRESHOLD {
                return;
            }
            let entry = best
                .entry(product_id)
                .or_insert_with(|| (score, text.to_string()));
            if score > entry.0 {
                *entry = (score, text.to_string());
            }
        };

        for p in &self.products {
            consider(p.id, &p.name_norm, &p.name);
        }
        for a in &self.aliases {
            consider(a.product_id, &a.alias_norm, &a.alias);
        }

        let mut suggestions: Vec<Suggestion> = best
            .into_iter()
            .filter_map(|(product_id, (score, matched_text))| {
                self.product(product_id).map(|p| Suggestion {
                    product: p.clone(),
                    score,
                    matched_text,
                })
            })
            .collect();
        suggestions.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.product.name.cmp(&b.product.name))
        });
        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }

    /// Product ids a shopping-list entry refers to.
    ///
    /// Tries, in order: an exact match; every product whose name or alias
    /// contains the normalized entry name; the same containment search with
    /// only the first significant word ("leche entera" -> "leche"). The first
    /// tier that finds anything wins. Ids are sorted and unique.
    #[must_use]
    pub fn match_entry(&self, name: &str) -> Vec<i64> {
        if let Some(product) = self.find_exact(name, None) {
            return vec![product.id];
        }

        let name_norm = normalize_name(name);
        let mut ids = self.containing(&name_norm);
        if ids.is_empty() {
            if let Some(word) = first_significant_word(name).filter(|w| *w != name_norm) {
                debug!("No match for '{}', retrying with '{}'", name, word);
                ids = self.containing(&word);
            }
        }
        ids
    }

    fn containing(&self, needle: &str) -> Vec<i64> {
        if needle.is_empty() {
            return Vec::new();
        }
        let mut ids: Vec<i64> = self
            .products
            .iter()
            .filter(|p| p.name_norm.contains(needle))
            .map(|p| p.id)
            .chain(
                self.aliases
                    .iter()
                    .filter(|a| a.alias_norm.contains(needle))
                    .map(|a| a.product_id),
            )
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Alias precedence among same-text aliases.
///
/// With a store context, an alias scoped to that store wins over a global
/// one and aliases scoped to other stores are ignored. Without one, a global
/// alias wins over the oldest store-scoped one.
fn pick_alias<'a>(
    candidates: &[&'a product_alias::Model],
    store_name: Option<&str>,
) -> Option<&'a product_alias::Model> {
    let store_norm = store_name.map(normalize_name).filter(|s| !s.is_empty());
    let global = candidates.iter().find(|a| a.store_name.is_none());
    match store_norm {
        Some(store) => candidates
            .iter()
            .find(|a| a.store_name.as_deref().map(normalize_name).as_ref() == Some(&store))
            .or(global),
        None => global.or_else(|| candidates.first()),
    }
    .copied()
}

/// Exact lookup: store-scoped alias, global alias, then product name.
pub async fn find_exact_match<C>(
    db: &C,
    name: &str,
    store_name: Option<&str>,
) -> Result<Option<product_entity::Model>>
where
    C: ConnectionTrait,
{
    let aliases = alias::find_aliases_by_text(db, name).await?;
    let candidates: Vec<&product_alias::Model> = aliases.iter().collect();
    let alias_product_id = pick_alias(&candidates, store_name).map(|a| a.product_id);

    if let Some(product_id) = alias_product_id {
        if let Some(product) = product::get_product_by_id(db, product_id).await? {
            debug!("Resolved '{}' to product {} via alias", name, product.id);
            return Ok(Some(product));
        }
    }

    product::get_product_by_name(db, name).await
}

/// Fuzzy suggestions using the default scorer.
pub async fn suggest_products(db: &DatabaseConnection, name: &str) -> Result<Vec<Suggestion>> {
    let catalog = Catalog::load(db).await?;
    Ok(catalog.suggest(name, &OverlapScorer))
}

/// Resolves a free-text name: exact match, fuzzy suggestions, or nothing.
#[instrument(skip(db))]
pub async fn resolve(
    db: &DatabaseConnection,
    name: &str,
    store_name: Option<&str>,
) -> Result<Resolution> {
    if let Some(product) = find_exact_match(db, name, store_name).await? {
        return Ok(Resolution::Exact(product));
    }
    let suggestions = suggest_products(db, name).await?;
    if suggestions.is_empty() {
        Ok(Resolution::NoMatch)
    } else {
        Ok(Resolution::Suggestions(suggestions))
    }
}

/// Products similar to an existing one, for merge suggestions.
///
/// The product itself is excluded. Unknown ids yield an empty list.
pub async fn find_similar_products(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Vec<Suggestion>> {
    let catalog = Catalog::load(db).await?;
    let Some(target) = catalog.product(product_id).cloned() else {
        return Ok(Vec::new());
    };
    let others = Catalog {
        products: catalog
            .products
            .into_iter()
            .filter(|p| p.id != product_id)
            .collect(),
        aliases: catalog
            .aliases
            .into_iter()
            .filter(|a| a.product_id != product_id)
            .collect(),
    };
    Ok(others.suggest(&target.name, &OverlapScorer))
}

/// Creates a product for a name nothing resolved to.
///
/// When the original typed/scanned text differs from the chosen canonical
/// name, it is attached as an alias (scoped to `store_name` if given) in the
/// same transaction.
#[instrument(skip(db))]
pub async fn create_product_from_candidate<C>(
    db: &C,
    canonical_name: &str,
    category: Option<String>,
    original_text: Option<&str>,
    store_name: Option<&str>,
) -> Result<product_entity::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let created = product::create_product(&txn, canonical_name, category).await?;
    if let Some(original) = original_text {
        let original_norm = normalize_name(original);
        if !original_norm.is_empty() && original_norm != created.name_norm {
            alias::create_alias(&txn, created.id, original, store_name).await?;
        }
    }
    txn.commit().await?;
    Ok(created)
}

/// Binds a typed/scanned name to an existing product without renaming it.
pub async fn link_to_product(
    db: &DatabaseConnection,
    product_id: i64,
    text: &str,
    store_name: Option<&str>,
) -> Result<product_alias::Model> {
    alias::create_alias(db, product_id, text, store_name).await
}
