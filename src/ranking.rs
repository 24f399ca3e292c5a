//! Relevance scoring and ranking of study resources against a search query.
//!
//! A record contributes a weighted similarity per query keyword: title tokens
//! count three times, the subject twice, school and teacher once. Missing
//! fields simply contribute nothing. Scores are unbounded and only meaningful
//! relative to other records scored for the same query.

use crate::keywords::{expand_query, extract_keywords};
use crate::matcher::typo_window_match;
use crate::similarity::similarity;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

const TITLE_WEIGHT: f64 = 3.0;
const SUBJECT_WEIGHT: f64 = 2.0;
const SCHOOL_WEIGHT: f64 = 1.0;
const TEACHER_WEIGHT: f64 = 1.0;

/// Read access to the metadata a resource exposes for ranking.
///
/// Every accessor is optional; absent metadata never fails scoring.
pub trait ResourceFields {
    fn title(&self) -> Option<&str>;
    fn subject_name(&self) -> Option<&str>;
    fn school_name(&self) -> Option<&str>;
    fn teacher_name(&self) -> Option<&str>;

    fn class_title(&self) -> Option<&str> {
        None
    }

    fn class_code(&self) -> Option<&str> {
        None
    }
}

/// A resource row as returned by the data store, reduced to the fields search
/// cares about. Unknown JSON fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub title: Option<String>,
    pub class: Option<ClassInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub title: Option<String>,
    pub code: Option<String>,
    pub subject: Option<Named>,
    pub school: Option<Named>,
    pub teacher: Option<Named>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Named {
    pub name: Option<String>,
}

impl CandidateRecord {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            class: None,
        }
    }

    fn class_field<'a>(&'a self, pick: impl Fn(&'a ClassInfo) -> Option<&'a Named>) -> Option<&'a str> {
        self.class
            .as_ref()
            .and_then(pick)
            .and_then(|named| named.name.as_deref())
    }
}

impl ResourceFields for CandidateRecord {
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn subject_name(&self) -> Option<&str> {
        self.class_field(|class| class.subject.as_ref())
    }

    fn school_name(&self) -> Option<&str> {
        self.class_field(|class| class.school.as_ref())
    }

    fn teacher_name(&self) -> Option<&str> {
        self.class_field(|class| class.teacher.as_ref())
    }

    fn class_title(&self) -> Option<&str> {
        self.class.as_ref().and_then(|class| class.title.as_deref())
    }

    fn class_code(&self) -> Option<&str> {
        self.class.as_ref().and_then(|class| class.code.as_deref())
    }
}

#[cfg(feature = "serde_json")]
impl ResourceFields for serde_json::Value {
    fn title(&self) -> Option<&str> {
        self.get("title").and_then(serde_json::Value::as_str)
    }

    fn subject_name(&self) -> Option<&str> {
        self.pointer("/class/subject/name")
            .and_then(serde_json::Value::as_str)
    }

    fn school_name(&self) -> Option<&str> {
        self.pointer("/class/school/name")
            .and_then(serde_json::Value::as_str)
    }

    fn teacher_name(&self) -> Option<&str> {
        self.pointer("/class/teacher/name")
            .and_then(serde_json::Value::as_str)
    }

    fn class_title(&self) -> Option<&str> {
        self.pointer("/class/title").and_then(serde_json::Value::as_str)
    }

    fn class_code(&self) -> Option<&str> {
        self.pointer("/class/code").and_then(serde_json::Value::as_str)
    }
}

/// A record paired with its relevance score and its position in the input.
#[derive(Debug, Clone, Serialize)]
pub struct Ranked<'a, T> {
    pub index: usize,
    pub score: f64,
    pub record: &'a T,
}

/// Weighted relevance of `record` for `query`.
pub fn score<T: ResourceFields + ?Sized>(query: &str, record: &T) -> f64 {
    let keywords = extract_keywords(query);
    score_keywords(&keywords, record)
}

fn score_keywords<T: ResourceFields + ?Sized>(keywords: &[String], record: &T) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let title_tokens = record.title().map(extract_keywords).unwrap_or_default();
    let weighted_fields = [
        (record.subject_name(), SUBJECT_WEIGHT),
        (record.school_name(), SCHOOL_WEIGHT),
        (record.teacher_name(), TEACHER_WEIGHT),
    ];

    let mut total = 0.0;
    for keyword in keywords {
        for token in &title_tokens {
            total += similarity(keyword, token) * TITLE_WEIGHT;
        }
        for (field, weight) in weighted_fields {
            if let Some(value) = field {
                total += similarity(keyword, value) * weight;
            }
        }
    }
    total
}

/// Scores every record and returns them best first. Equal scores keep their
/// input order.
pub fn rank<'a, T>(query: &str, records: &'a [T]) -> Vec<Ranked<'a, T>>
where
    T: ResourceFields + Sync,
{
    rank_candidates(query, records.iter().enumerate().collect())
}

fn rank_candidates<'a, T>(query: &str, candidates: Vec<(usize, &'a T)>) -> Vec<Ranked<'a, T>>
where
    T: ResourceFields + Sync,
{
    let keywords = extract_keywords(query);
    let mut ranked: Vec<Ranked<'a, T>> = candidates
        .into_par_iter()
        .map(|(index, record)| Ranked {
            index,
            score: score_keywords(&keywords, record),
            record,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked
}

/// Filters `records` to those plausibly about `query` and ranks the survivors.
///
/// A record survives when one of its text fields contains the query (or its
/// abbreviation-expanded form), or when a query word appears in a field with
/// a small number of typos. A blank query returns every record unscored, in
/// input order.
pub fn search<'a, T>(query: &str, records: &'a [T]) -> Vec<Ranked<'a, T>>
where
    T: ResourceFields + Sync,
{
    if query.trim().is_empty() {
        return records
            .iter()
            .enumerate()
            .map(|(index, record)| Ranked {
                index,
                score: 0.0,
                record,
            })
            .collect();
    }

    let query_lower = query.to_lowercase();
    let expanded_lower = expand_query(query).to_lowercase();
    let words: Vec<&str> = query_lower.split_whitespace().collect();

    let candidates: Vec<(usize, &'a T)> = records
        .par_iter()
        .enumerate()
        .filter(|(_, record)| {
            text_match(*record, &query_lower, &expanded_lower) || typo_match(*record, &words)
        })
        .collect();
    debug!(
        query,
        records = records.len(),
        kept = candidates.len(),
        "filtered search candidates"
    );
    rank_candidates(query, candidates)
}

fn text_match<T: ResourceFields>(record: &T, query_lower: &str, expanded_lower: &str) -> bool {
    [
        record.title(),
        record.class_title(),
        record.class_code(),
        record.subject_name(),
        record.school_name(),
        record.teacher_name(),
    ]
    .into_iter()
    .flatten()
    .any(|field| {
        let field = field.to_lowercase();
        field.contains(query_lower) || field.contains(expanded_lower)
    })
}

fn typo_match<T: ResourceFields>(record: &T, words: &[&str]) -> bool {
    [
        record.title(),
        record.class_title(),
        record.subject_name(),
        record.school_name(),
        record.teacher_name(),
    ]
    .into_iter()
    .flatten()
    .any(|field| words.iter().any(|word| typo_window_match(word, field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(title: &str, subject: &str, school: &str, teacher: &str) -> CandidateRecord {
        CandidateRecord {
            title: Some(title.to_string()),
            class: Some(ClassInfo {
                title: None,
                code: None,
                subject: Some(Named {
                    name: Some(subject.to_string()),
                }),
                school: Some(Named {
                    name: Some(school.to_string()),
                }),
                teacher: Some(Named {
                    name: Some(teacher.to_string()),
                }),
            }),
        }
    }

    #[test]
    fn empty_record_scores_zero() {
        let empty = CandidateRecord::default();
        assert_eq!(score("biology cells", &empty), 0.0);
        assert_eq!(score("", &empty), 0.0);
    }

    #[test]
    fn stop_word_query_scores_zero() {
        let rec = record("Cell Biology Notes", "Biology", "Lincoln High", "Ms. Park");
        assert_eq!(score("the of an", &rec), 0.0);
    }

    #[test]
    fn related_title_outranks_unrelated() {
        let related = CandidateRecord::titled("Cell Biology Notes");
        let unrelated = CandidateRecord::titled("Unrelated Physics Topic");
        assert!(score("biology cells", &related) > score("biology cells", &unrelated));
    }

    #[test]
    fn title_match_is_weighted_three_times() {
        let rec = CandidateRecord::titled("biology");
        assert!((score("biology", &rec) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn field_weights_add_up() {
        let rec = record("zzzz", "biology", "biology", "biology");
        // subject 2 + school 1 + teacher 1, title contributes nothing
        assert!((score("biology", &rec) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn partially_filled_class_is_fine() {
        let rec = CandidateRecord {
            title: None,
            class: Some(ClassInfo {
                subject: Some(Named { name: None }),
                teacher: Some(Named {
                    name: Some("Chemistry".to_string()),
                }),
                ..ClassInfo::default()
            }),
        };
        assert!((score("chemistry", &rec) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rank_orders_best_first_and_is_stable() {
        let records = vec![
            CandidateRecord::titled("Unrelated Physics Topic"),
            CandidateRecord::titled("Cell Biology Notes"),
            CandidateRecord::default(),
            CandidateRecord::default(),
        ];
        let ranked = rank("biology cells", &records);
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order[0], 1);
        assert_eq!(&order[2..], &[2, 3]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn deserializes_data_store_rows() {
        let rows = json!([
            {
                "id": "r1",
                "title": "Cell Biology Notes",
                "class": {
                    "code": "BIO 101",
                    "subject": { "name": "Biology" },
                    "school": { "name": "Lincoln High", "city": "Austin" },
                    "teacher": null
                }
            },
            { "title": null }
        ]);
        let records: Vec<CandidateRecord> = serde_json::from_value(rows).unwrap();
        assert_eq!(records[0].subject_name(), Some("Biology"));
        assert_eq!(records[0].class_code(), Some("BIO 101"));
        assert_eq!(records[0].teacher_name(), None);
        assert_eq!(records[1], CandidateRecord::default());
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn json_values_rank_like_records() {
        let value = json!({
            "title": "Cell Biology Notes",
            "class": { "subject": { "name": "Biology" } }
        });
        let typed: CandidateRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(score("biology", &value), score("biology", &typed));
    }

    #[test]
    fn search_filters_then_ranks() {
        let records = vec![
            record("Midterm Review", "Physics", "Lincoln High", "Mr. Ortiz"),
            record("Cell Biology Notes", "Biology", "Lincoln High", "Ms. Park"),
            record("Photosynthesis", "Biology", "Roosevelt", "Ms. Park"),
        ];
        let hits = search("biology", &records);
        let indices: Vec<usize> = hits.iter().map(|hit| hit.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn search_uses_abbreviation_expansion() {
        let records = vec![
            record("Unit 3", "Chemistry", "Roosevelt", "Dr. Li"),
            record("Unit 3", "History", "Roosevelt", "Dr. Li"),
        ];
        let hits = search("chem", &records);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 0);
    }

    #[test]
    fn search_tolerates_typos() {
        let records = vec![CandidateRecord::titled("Intro to Calculus")];
        assert_eq!(search("calculas", &records).len(), 1);
        assert!(search("geometry", &records).is_empty());
    }

    #[test]
    fn blank_search_returns_everything_unscored() {
        let records = vec![CandidateRecord::titled("b"), CandidateRecord::titled("a")];
        let hits = search("  ", &records);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 0);
        assert!(hits.iter().all(|hit| hit.score == 0.0));
    }
}
