use criterion::{Criterion, criterion_group, criterion_main};
use mention_tracker_engine::editing::{adjust, selection::correct_selection};
use mention_tracker_engine::{Span, SpanStore, serialize};

/// Buffer of `count` mentions separated by filler text, with its store
fn dense_buffer(count: usize) -> (String, SpanStore) {
    let mut store = SpanStore::new(count);
    let mut text = String::new();
    for user_id in 0..count {
        text.push_str("some text ");
        let span = Span::mention(user_id as i64, "@", "someone", text.encode_utf16().count());
        text.push_str(&span.display_text);
        store.add(span).unwrap();
    }
    (text, store)
}

fn bench_offset_adjustment(c: &mut Criterion) {
    let mut group = c.benchmark_group("adjust");
    group.sample_size(20);

    let (_, store) = dense_buffer(1000);

    group.bench_function("insert_then_delete_at_start", |b| {
        let mut s = store.clone();
        b.iter(|| {
            adjust::apply_post_edit(&mut s, std::hint::black_box(0), 4);
            adjust::apply_pre_edit(&mut s, std::hint::black_box(0), 4);
        });
    });

    group.bench_function("correct_selection", |b| {
        b.iter(|| {
            let corrected = correct_selection(&store, std::hint::black_box(5_000..9_000));
            std::hint::black_box(corrected);
        });
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    group.sample_size(20);

    let (text, store) = dense_buffer(1000);
    group.bench_function("serialize_1000", |b| {
        b.iter(|| {
            let exchange = serialize(std::hint::black_box(&text), store.all()).unwrap();
            std::hint::black_box(exchange);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_offset_adjustment, bench_serialization);
criterion_main!(benches);
