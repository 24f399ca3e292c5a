use std::fmt;

const BLOCKED_WORDS: &[&str] = &["shit", "cunt", "nigga", "nigger"];

const LEET_SUBSTITUTIONS: &[(char, char)] = &[
    ('@', 'a'),
    ('3', 'e'),
    ('1', 'i'),
    ('0', 'o'),
    ('5', 's'),
    ('7', 't'),
    ('$', 's'),
    ('+', 't'),
    ('!', 'i'),
    ('4', 'a'),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationError {
    InappropriateLanguage,
}

impl fmt::Display for ModerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModerationError::InappropriateLanguage => write!(
                f,
                "text contains inappropriate language; please use respectful language"
            ),
        }
    }
}

impl std::error::Error for ModerationError {}

/// True when `text` contains a blocked word, either verbatim or spelled with
/// digit look-alikes ("sh1t"). Only whole words are checked.
pub fn contains_profanity(text: &str) -> bool {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();

    if words.iter().any(|word| is_blocked(word)) {
        return true;
    }
    words
        .iter()
        .map(|word| unleet(word))
        .any(|word| is_blocked(&word))
}

/// Trimmed `text`, or an error if it contains profanity.
pub fn sanitize_text(text: &str) -> Result<String, ModerationError> {
    if contains_profanity(text) {
        return Err(ModerationError::InappropriateLanguage);
    }
    Ok(text.trim().to_string())
}

fn is_blocked(word: &str) -> bool {
    BLOCKED_WORDS.contains(&word)
}

fn unleet(word: &str) -> String {
    word.chars()
        .map(|c| {
            LEET_SUBSTITUTIONS
                .iter()
                .find(|(from, _)| *from == c)
                .map_or(c, |(_, to)| *to)
        })
        .collect()
}
