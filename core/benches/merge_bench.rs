use criterion::{black_box, criterion_group, criterion_main, Criterion};
use retrieval::boolean::{intersect, MergeList};
use retrieval::index::assign_skips;
use retrieval::tokenizer::tokenize;
use retrieval::ScoredPosting;

fn postings(step: u32, len: u32) -> Vec<ScoredPosting> {
    (0..len).map(|i| ScoredPosting::new(i * step, 1.0)).collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let text = "The appellant's claim for damages arising from the breach of contract was dismissed, \
                and the court awarded costs to the respondent. "
        .repeat(200);
    c.bench_function("tokenize_judgment", |b| b.iter(|| tokenize(black_box(&text))));
}

fn bench_intersect(c: &mut Criterion) {
    let dense = postings(1, 100_000);
    let sparse = postings(997, 100);

    let stored = MergeList::stored(dense.clone(), assign_skips(dense.len(), 2));
    let plain = MergeList::plain(dense);
    let short = MergeList::plain(sparse);

    c.bench_function("intersect_skips", |b| b.iter(|| intersect(black_box(&stored), black_box(&short))));
    c.bench_function("intersect_linear", |b| b.iter(|| intersect(black_box(&plain), black_box(&short))));
}

criterion_group!(benches, bench_tokenize, bench_intersect);
criterion_main!(benches);
