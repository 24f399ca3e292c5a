//! Text relevance for study resources: fuzzy matching, weighted ranking of
//! resource records against a search query, and title suggestions for new
//! uploads.
//!
//! Everything here is pure and synchronous. The only shared state is the
//! read-only catalogs (stop words, abbreviations, naming patterns), so every
//! function can be called from any thread without coordination.

pub mod keywords;
pub mod matcher;
pub mod moderation;
pub mod ranking;
pub mod similarity;
pub mod suggestions;

#[cfg(feature = "web")]
pub mod web;

use serde::{Deserialize, Serialize};

pub use keywords::{expand_query, extract_keywords};
pub use matcher::{DEFAULT_THRESHOLD, find_matches, is_match, typo_window_match};
pub use moderation::{ModerationError, contains_profanity, sanitize_text};
pub use ranking::{CandidateRecord, ClassInfo, Named, Ranked, ResourceFields, rank, score, search};
pub use similarity::{levenshtein_distance, similarity};
pub use suggestions::{
    MAX_SUGGESTIONS, ResourceType, generate_suggestions, rank_suggestions, suggestion_score,
};

/// Knobs shared by the command-line and HTTP front ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum similarity for a fuzzy match.
    pub threshold: f64,
    /// Maximum number of results to return.
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: 10,
        }
    }
}

impl SearchConfig {
    /// Copy with the threshold clamped into `[0, 1]` and a limit of at least one.
    pub fn normalized(self) -> Self {
        Self {
            threshold: self.threshold.clamp(0.0, 1.0),
            limit: self.limit.max(1),
        }
    }
}
