use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use study_search::{
    CandidateRecord, ClassInfo, Named, ResourceType, find_matches, generate_suggestions, rank,
    search, similarity,
};

const SUBJECTS: &[&str] = &["Biology", "Chemistry", "Physics", "Calculus", "History"];
const TITLES: &[&str] = &[
    "Cell Biology Notes",
    "Organic Chemistry Reactions",
    "Kinematics and Dynamics",
    "Derivatives and Integrals",
    "World War II Timeline",
    "Midterm Study Guide",
    "Chapter 4 Practice Problems",
];

fn named(name: &str) -> Option<Named> {
    Some(Named {
        name: Some(name.to_string()),
    })
}

fn corpus(size: usize) -> Vec<CandidateRecord> {
    (0..size)
        .map(|i| CandidateRecord {
            title: Some(format!("{} {}", TITLES[i % TITLES.len()], i)),
            class: Some(ClassInfo {
                subject: named(SUBJECTS[i % SUBJECTS.len()]),
                school: named("Lincoln High School"),
                teacher: named("Ms. Alvarez"),
                ..ClassInfo::default()
            }),
        })
        .collect()
}

fn bench_similarity(c: &mut Criterion) {
    const PAIRS: &[(&str, &str)] = &[
        ("cell", "cells"),
        ("chemistry", "chemestry"),
        ("thermodynamics", "electromagnetism"),
    ];
    for &(a, b) in PAIRS {
        c.bench_with_input(
            BenchmarkId::new("similarity", format!("{a}_{b}")),
            &(a, b),
            |bench, &(a, b)| bench.iter(|| black_box(similarity(a, b))),
        );
    }
}

fn bench_find_matches(c: &mut Criterion) {
    let items: Vec<String> = corpus(500)
        .into_iter()
        .filter_map(|record| record.title)
        .collect();
    c.bench_function("find_matches::500_titles", |b| {
        b.iter(|| black_box(find_matches("biolgy notes", &items, 0.6).len()))
    });
}

fn bench_ranking(c: &mut Criterion) {
    for &size in &[100usize, 1_000] {
        let records = corpus(size);
        c.bench_with_input(BenchmarkId::new("rank", size), &records, |b, records| {
            b.iter(|| black_box(rank("cell biology midterm", records).len()))
        });
        c.bench_with_input(BenchmarkId::new("search", size), &records, |b, records| {
            b.iter(|| black_box(search("chem reactions", records).len()))
        });
    }
}

fn bench_suggestions(c: &mut Criterion) {
    c.bench_function("generate_suggestions::chapter", |b| {
        b.iter(|| {
            black_box(generate_suggestions(
                "Chapter 7 genetics",
                Some(ResourceType::StudyGuide),
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_similarity,
    bench_find_matches,
    bench_ranking,
    bench_suggestions
);
criterion_main!(benches);
