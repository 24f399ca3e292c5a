use rapidfuzz::distance::levenshtein;

/// Edit distance between two strings, counted in chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    levenshtein::distance(a.chars(), b.chars())
}

/// Normalized similarity in `[0, 1]`; `1.0` means identical ignoring case.
///
/// Both inputs are lowercased before comparison and the distance is divided by
/// the longer of the two lowercased lengths. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein_distance(&a, &b);
    1.0 - distance as f64 / max_len as f64
}
