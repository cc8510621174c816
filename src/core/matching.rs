//! Name normalization and similarity scoring.
//!
//! Free-text names (typed, dictated or read off a receipt) are normalized
//! before any comparison: lowercased, trimmed and with whitespace runs
//! collapsed. Accents are kept as-is.
//!
//! Scoring is pluggable through [`SimilarityScorer`]; the resolver only
//! cares about a number in `0.0..=1.0`.

/// Minimum score for a fuzzy suggestion to be kept.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.3;

/// Maximum number of fuzzy suggestions returned.
pub const MAX_SUGGESTIONS: usize = 5;

/// Score when one normalized name contains the other.
pub const CONTAINMENT_SCORE: f64 = 0.8;

/// Weight applied to the token-overlap fraction.
pub const OVERLAP_WEIGHT: f64 = 0.7;

/// Lowercases, trims and collapses whitespace.
#[must_use]
pub fn normalize_name(input: &str) -> String {
    input
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Words longer than two characters; articles and prepositions like "de"
/// or "la" are skipped.
pub fn significant_words(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split_whitespace()
        .filter(|word| word.chars().count() > 2)
}

/// First significant word of a name, normalized ("Leche entera" -> "leche").
#[must_use]
pub fn first_significant_word(name: &str) -> Option<String> {
    let normalized = normalize_name(name);
    significant_words(&normalized).next().map(str::to_string)
}

/// Scores how similar a candidate name is to a known name.
///
/// Both arguments are already normalized. Implementations return a value in
/// `0.0..=1.0`.
pub trait SimilarityScorer {
    /// Similarity between `candidate` and `target`.
    fn score(&self, candidate: &str, target: &str) -> f64;
}

impl<F> SimilarityScorer for F
where
    F: Fn(&str, &str) -> f64,
{
    fn score(&self, candidate: &str, target: &str) -> f64 {
        self(candidate, target)
    }
}

/// Default scorer combining containment and token overlap.
///
/// - identical names score 1.0
/// - one name containing the other scores [`CONTAINMENT_SCORE`]
/// - otherwise the fraction of the candidate's significant words found in
///   the target, weighted by [`OVERLAP_WEIGHT`]
///
/// The best of the containment and overlap scores is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapScorer;

impl SimilarityScorer for OverlapScorer {
    fn score(&self, candidate: &str, target: &str) -> f64 {
        if candidate.is_empty() || target.is_empty() {
            return 0.0;
        }
        if candidate == target {
            return 1.0;
        }

        let containment = if target.contains(candidate) || candidate.contains(target) {
            CONTAINMENT_SCORE
        } else {
            0.0
        };

        let candidate_words: Vec<&str> = significant_words(candidate).collect();
        if candidate_words.is_empty() {
            return containment;
        }
        let target_words: Vec<&str> = significant_words(target).collect();
        let shared = candidate_words
            .iter()
            .filter(|word| target_words.contains(word))
            .count();

        // Cast safety: word counts are tiny.
        #[allow(clippy::cast_precision_loss)]
        let overlap = shared as f64 / candidate_words.len() as f64;

        containment.max(overlap * OVERLAP_WEIGHT)
    }
}
