//! Title suggestions for new uploads.
//!
//! Suggestions come from a fixed catalog of naming patterns whose `{number}`
//! and `{topic}` placeholders are filled from what the user typed so far,
//! followed by a few canned titles for the chosen resource type.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Upper bound on suggestions returned for one input.
pub const MAX_SUGGESTIONS: usize = 5;

const MIN_INPUT_LEN: usize = 2;
const DEFAULT_NUMBER: &str = "1";
const DEFAULT_TOPIC: &str = "Topic";

pub const RESOURCE_PATTERNS: &[&str] = &[
    "Chapter {number} Notes",
    "Chapter {number} - {topic}",
    "Lecture {number} Notes",
    "Week {number} Notes",
    "Unit {number} Study Guide",
    "{topic} Study Guide",
    "{topic} Practice Problems",
    "{topic} Exam Review",
    "Midterm Study Guide",
    "Final Exam Review",
    "Quiz {number} Review",
    "Assignment {number} Solution",
    "{topic} Cheat Sheet",
    "{topic} Summary",
    "{topic} Examples",
    "Calculus - {topic}",
    "Physics - {topic}",
    "Chemistry - {topic}",
    "Biology - {topic}",
    "History - {topic}",
    "Psychology - {topic}",
    "Economics - {topic}",
    "Computer Science - {topic}",
    "Statistics - {topic}",
    "Linear Algebra - {topic}",
    "Derivatives and Integrals",
    "Kinematics and Dynamics",
    "Organic Chemistry Reactions",
    "Cell Biology Basics",
    "World War II Timeline",
    "Cognitive Psychology",
    "Supply and Demand",
    "Data Structures",
    "Probability Distributions",
    "Matrix Operations",
];

pub const TOPIC_KEYWORDS: &[&str] = &[
    "derivatives", "integrals", "limits", "functions", "equations",
    "kinematics", "thermodynamics", "electromagnetism", "waves", "optics",
    "organic", "inorganic", "reactions", "molecules", "bonds",
    "cell", "genetics", "evolution", "ecology", "anatomy",
    "revolution", "war", "empire", "renaissance", "enlightenment",
    "memory", "learning", "behavior", "development", "personality",
    "market", "inflation", "gdp", "trade", "monetary",
    "algorithms", "programming", "databases", "networks", "software",
    "statistics", "probability", "regression", "hypothesis", "sampling",
];

/// Kind of study resource being uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", value(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Notes,
    StudyGuide,
    PracticeSet,
    PastMaterial,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Notes,
        ResourceType::StudyGuide,
        ResourceType::PracticeSet,
        ResourceType::PastMaterial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Notes => "notes",
            ResourceType::StudyGuide => "study_guide",
            ResourceType::PracticeSet => "practice_set",
            ResourceType::PastMaterial => "past_material",
        }
    }

    /// Canned titles for this type, given the lowercased input.
    fn hints(&self, lower_input: &str) -> Vec<&'static str> {
        let mut hints = Vec::new();
        match self {
            ResourceType::Notes => {
                if lower_input.contains("chapter") {
                    hints.push("Chapter Notes - Complete");
                }
                if lower_input.contains("lecture") {
                    hints.push("Lecture Notes - Detailed");
                }
            }
            ResourceType::StudyGuide => {
                hints.push("Complete Study Guide");
                hints.push("Comprehensive Review Guide");
                if lower_input.contains("exam") || lower_input.contains("test") {
                    hints.push("Exam Study Guide - All Topics");
                }
            }
            ResourceType::PracticeSet => {
                hints.push("Practice Problems Set");
                hints.push("Problem Set with Solutions");
                if lower_input.contains("homework") {
                    hints.push("Homework Problems - Solved");
                }
            }
            ResourceType::PastMaterial => {
                hints.push("Past Exam - Sample Questions");
                hints.push("Previous Quiz - Study Material");
            }
        }
        hints
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResourceTypeError(String);

impl fmt::Display for ParseResourceTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown resource type {:?} (expected notes, study_guide, practice_set or past_material)",
            self.0
        )
    }
}

impl std::error::Error for ParseResourceTypeError {}

impl FromStr for ResourceType {
    type Err = ParseResourceTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace('-', "_");
        ResourceType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseResourceTypeError(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionError {
    UnknownPlaceholder { pattern: String, name: String },
    UnclosedPlaceholder { pattern: String },
}

impl fmt::Display for SuggestionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionError::UnknownPlaceholder { pattern, name } => {
                write!(f, "unknown placeholder {{{name}}} in pattern {pattern:?}")
            }
            SuggestionError::UnclosedPlaceholder { pattern } => {
                write!(f, "unclosed placeholder in pattern {pattern:?}")
            }
        }
    }
}

impl std::error::Error for SuggestionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Number,
    Topic,
}

fn parse_template(pattern: &str) -> Result<Vec<Segment<'_>>, SuggestionError> {
    let mut segments = Vec::new();
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        if open > 0 {
            segments.push(Segment::Literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| SuggestionError::UnclosedPlaceholder {
                pattern: pattern.to_string(),
            })?;
        let segment = match &after[..close] {
            "number" => Segment::Number,
            "topic" => Segment::Topic,
            other => {
                return Err(SuggestionError::UnknownPlaceholder {
                    pattern: pattern.to_string(),
                    name: other.to_string(),
                });
            }
        };
        segments.push(segment);
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

/// Values the placeholders resolve to for one input.
struct Fill<'a> {
    number: &'a str,
    topic: &'a str,
}

impl<'a> Fill<'a> {
    fn from_input(input: &'a str) -> Self {
        Self {
            number: first_digit_run(input).unwrap_or(DEFAULT_NUMBER),
            topic: guess_topic(input).unwrap_or(DEFAULT_TOPIC),
        }
    }

    fn render(&self, segments: &[Segment<'_>]) -> String {
        let mut out = String::new();
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Number => out.push_str(self.number),
                Segment::Topic => out.push_str(self.topic),
            }
        }
        out
    }
}

fn first_digit_run(input: &str) -> Option<&str> {
    let start = input.find(|c: char| c.is_ascii_digit())?;
    let tail = &input[start..];
    let len = tail
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(tail.len());
    Some(&tail[..len])
}

/// First space-separated token related to a topic keyword. An empty token
/// (from a leading or doubled space) relates to every keyword and wins if it
/// comes first, which leaves the topic unresolved.
fn guess_topic(input: &str) -> Option<&str> {
    input
        .split(' ')
        .find(|word| {
            let lower = word.to_lowercase();
            TOPIC_KEYWORDS
                .iter()
                .any(|keyword| lower.contains(*keyword) || keyword.contains(lower.as_str()))
        })
        .filter(|word| !word.is_empty())
}

/// Up to [`MAX_SUGGESTIONS`] distinct titles for an upload named `input`.
///
/// Never fails: inputs shorter than two chars yield nothing, and any internal
/// error is logged and turned into an empty list. `None` for the resource type
/// skips the type-specific titles.
pub fn generate_suggestions(input: &str, resource_type: Option<ResourceType>) -> Vec<String> {
    or_empty(input, suggest_from(input, resource_type, RESOURCE_PATTERNS))
}

fn or_empty(input: &str, result: Result<Vec<String>, SuggestionError>) -> Vec<String> {
    match result {
        Ok(suggestions) => suggestions,
        Err(err) => {
            warn!(%err, input, "error generating suggestions");
            Vec::new()
        }
    }
}

fn suggest_from(
    input: &str,
    resource_type: Option<ResourceType>,
    patterns: &[&str],
) -> Result<Vec<String>, SuggestionError> {
    if input.chars().count() < MIN_INPUT_LEN {
        return Ok(Vec::new());
    }
    let lower_input = input.to_lowercase();
    let fill = Fill::from_input(input);

    let mut suggestions = Vec::new();
    for pattern in patterns {
        let pattern_lower = pattern.to_lowercase();
        let first_word = pattern_lower.split(' ').next().unwrap_or_default();
        if pattern_lower.contains(&lower_input) || lower_input.contains(first_word) {
            let segments = parse_template(pattern)?;
            suggestions.push(fill.render(&segments));
        }
    }
    if let Some(kind) = resource_type {
        suggestions.extend(kind.hints(&lower_input).into_iter().map(str::to_string));
    }

    let mut seen = HashSet::new();
    suggestions.retain(|suggestion| seen.insert(suggestion.clone()));
    suggestions.truncate(MAX_SUGGESTIONS);
    Ok(suggestions)
}

/// How well `suggestion` fits `input`, from 0 to 100.
///
/// Exact match (ignoring case) is 100, a prefix match 90, and 80 when every
/// input word appears inside some suggestion word. Otherwise the share of
/// input words found anywhere in the suggestion, scaled to 70.
pub fn suggestion_score(suggestion: &str, input: &str) -> f64 {
    let lower_suggestion = suggestion.to_lowercase();
    let lower_input = input.to_lowercase();

    if lower_suggestion == lower_input {
        return 100.0;
    }
    if lower_suggestion.starts_with(&lower_input) {
        return 90.0;
    }

    let input_words: Vec<&str> = lower_input.split(' ').collect();
    let suggestion_words: Vec<&str> = lower_suggestion.split(' ').collect();
    let all_words_present = input_words
        .iter()
        .all(|word| suggestion_words.iter().any(|s_word| s_word.contains(*word)));
    if all_words_present {
        return 80.0;
    }

    let partial = input_words
        .iter()
        .filter(|word| lower_suggestion.contains(**word))
        .count();
    partial as f64 / input_words.len() as f64 * 70.0
}

/// Generated suggestions paired with their [`suggestion_score`], best first.
pub fn rank_suggestions(input: &str, resource_type: Option<ResourceType>) -> Vec<(String, f64)> {
    let mut scored: Vec<(String, f64)> = generate_suggestions(input, resource_type)
        .into_iter()
        .map(|suggestion| {
            let score = suggestion_score(&suggestion, input);
            (suggestion, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored
}
