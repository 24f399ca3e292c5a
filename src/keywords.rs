use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::collections::HashSet;

/// Words dropped from queries before scoring.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Tokens this short (in chars) carry no signal.
const MAX_DROPPED_LEN: usize = 2;

static ABBREVIATIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("math", "mathematics"),
        ("bio", "biology"),
        ("chem", "chemistry"),
        ("phys", "physics"),
        ("psych", "psychology"),
        ("econ", "economics"),
        ("calc", "calculus"),
        ("stats", "statistics"),
        ("cs", "computer science"),
        ("eng", "english"),
        ("hist", "history"),
    ])
});

/// Lowercased, stop-word-free, deduplicated tokens longer than two chars, in
/// first-seen order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut seen = HashSet::new();
    lowered
        .split_whitespace()
        .filter(|word| word.chars().count() > MAX_DROPPED_LEN)
        .filter(|word| !STOP_WORDS.contains(word))
        .filter(|word| seen.insert(*word))
        .map(str::to_string)
        .collect()
}

/// Expands common subject abbreviations ("bio", "calc", "cs", ...) to their
/// full names. Unknown tokens pass through unchanged.
pub fn expand_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| expansion_for(term).unwrap_or(term))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full name for an abbreviation, if one is known.
pub fn expansion_for(term: &str) -> Option<&'static str> {
    ABBREVIATIONS.get(term.to_lowercase().as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stop_words_and_short_tokens() {
        assert_eq!(
            extract_keywords("The Cell Biology of Plants"),
            vec!["cell", "biology", "plants"]
        );
        assert_eq!(extract_keywords("AP US go"), Vec::<String>::new());
    }

    #[test]
    fn dedups_in_first_seen_order() {
        assert_eq!(
            extract_keywords("cells  Cells\tmitosis CELLS meiosis mitosis"),
            vec!["cells", "mitosis", "meiosis"]
        );
    }

    #[test]
    fn every_keyword_is_longer_than_two_chars() {
        let keywords = extract_keywords("a bb ccc dddd and for with über");
        assert!(keywords.iter().all(|k| k.chars().count() > 2));
        assert_eq!(keywords, vec!["ccc", "dddd", "über"]);
    }

    #[test]
    fn empty_text_has_no_keywords() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   ").is_empty());
    }

    #[test]
    fn expands_known_abbreviations() {
        assert_eq!(expand_query("  bio   exam "), "biology exam");
        assert_eq!(expand_query("AP Calc"), "AP calculus");
        assert_eq!(expand_query("CS 101"), "computer science 101");
        assert_eq!(expand_query(""), "");
    }

    #[test]
    fn expansion_lookup_ignores_case() {
        assert_eq!(expansion_for("Stats"), Some("statistics"));
        assert_eq!(expansion_for("geometry"), None);
    }
}
