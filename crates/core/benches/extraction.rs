use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use threadwatch_core::store::{MessageId, merge_ids};
use threadwatch_core::{Document, SiteLayout, ThreadStyle, extract_candidates, extract_messages};

fn fixture() -> String {
    std::fs::read_to_string("../../tests/fixtures/thread_page.html").unwrap()
}

/// The fixture page repeated `n` times inside one body, like a long thread page.
fn repeated(n: usize) -> String {
    let page = fixture();
    let start = page.find("<body>").unwrap() + "<body>".len();
    let end = page.rfind("</body>").unwrap();
    format!("<html><body>{}</body></html>", page[start..end].repeat(n))
}

fn bench_parse(c: &mut Criterion) {
    let small = fixture();
    let large = repeated(20);

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("page", "8 posts"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("page", "160 posts"), &large, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_candidates(c: &mut Criterion) {
    let html = repeated(20);
    let doc = Document::parse(&html).unwrap();
    let layout = SiteLayout::default().compile().unwrap();

    c.bench_function("candidate_filtering", |b| b.iter(|| extract_candidates(black_box(&doc), &layout)));
}

fn bench_full_extraction(c: &mut Criterion) {
    let html = repeated(20);
    let layout = SiteLayout::default().compile().unwrap();
    let style = ThreadStyle::default();

    c.bench_function("full_extraction", |b| b.iter(|| extract_messages(black_box(&html), &layout, &style)));
}

fn bench_merge_ids(c: &mut Criterion) {
    let existing: Vec<MessageId> = (0..5000).map(|i| MessageId::of_text(&i.to_string())).collect();
    let incoming: Vec<MessageId> = (4990..5030).map(|i| MessageId::of_text(&i.to_string())).collect();

    c.bench_function("merge_ids", |b| {
        b.iter(|| merge_ids(black_box(existing.clone()), black_box(incoming.clone()), 5000))
    });
}

criterion_group!(benches, bench_parse, bench_candidates, bench_full_extraction, bench_merge_ids);
criterion_main!(benches);
