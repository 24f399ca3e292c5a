use crate::similarity::{levenshtein_distance, similarity};

/// Similarity a pair must reach to count as a fuzzy match.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Minimum word length considered by [`typo_window_match`].
const MIN_TYPO_WORD_LEN: usize = 3;

/// Returns true when either string contains the other (ignoring case), or when
/// their similarity reaches `threshold`.
///
/// Containment is checked first and always wins, so an empty string matches
/// everything.
pub fn is_match(a: &str, b: &str, threshold: f64) -> bool {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    if a_lower.contains(&b_lower) || b_lower.contains(&a_lower) {
        return true;
    }
    similarity(a, b) >= threshold
}

/// Stable filter of `items` down to those that fuzzy-match `query`.
///
/// A blank query matches nothing.
pub fn find_matches<'a, S>(query: &str, items: &'a [S], threshold: f64) -> Vec<&'a str>
where
    S: AsRef<str>,
{
    if query.trim().is_empty() {
        return Vec::new();
    }
    items
        .iter()
        .map(AsRef::as_ref)
        .filter(|item| is_match(query, item, threshold))
        .collect()
}

/// Typo-tolerant containment: slides a window of `word`'s length across
/// `field` and accepts the first window within `max(1, len / 5)` edits.
///
/// Words shorter than three chars never match.
pub fn typo_window_match(word: &str, field: &str) -> bool {
    let word: Vec<char> = word.to_lowercase().chars().collect();
    let field: Vec<char> = field.to_lowercase().chars().collect();
    let len = word.len();
    if len < MIN_TYPO_WORD_LEN || field.len() < len {
        return false;
    }
    let budget = (len / 5).max(1);
    let word: String = word.into_iter().collect();
    field.windows(len).any(|window| {
        let window: String = window.iter().collect();
        levenshtein_distance(&word, &window) <= budget
    })
}
