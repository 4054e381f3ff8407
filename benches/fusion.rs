use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use recall::search::fusion::{CandidateFields, KeywordHit, SemanticHit, fuse};
use std::hint::black_box;

fn fields(day: u32) -> CandidateFields {
    CandidateFields {
        title: "A title".to_string(),
        description: String::new(),
        url: String::new(),
        content_kind: "webpage".to_string(),
        category: "General".to_string(),
        date_added: NaiveDate::from_ymd_opt(2026, 7, 1 + day % 28)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid bench date"),
        text: String::new(),
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    // 100 semantic hits and 100 keyword hits with a 50-record overlap
    let semantic: Vec<SemanticHit> = (0..100)
        .map(|i| SemanticHit {
            id: format!("record-{}", i),
            similarity: 1.0 - i as f32 / 200.0,
            fields: fields(i),
        })
        .collect();
    let keyword: Vec<KeywordHit> = (50..150)
        .map(|i| KeywordHit {
            id: format!("record-{}", i),
            fields: fields(i),
        })
        .collect();

    c.bench_function("fuse_200_hits", |b| {
        b.iter(|| {
            fuse(
                black_box(semantic.clone()),
                black_box(keyword.clone()),
                black_box(0.7),
            )
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
