use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kensaku_core::ngram::divide_ngrams;

fn bench_divide_ngrams(c: &mut Criterion) {
    let text = "吾輩は猫である。名前はまだ無い。どこで生れたかとんと見当がつかぬ。\
                何でも薄暗いじめじめした所でニャーニャー泣いていた事だけは記憶している。"
        .repeat(50);
    c.bench_function("divide_ngrams_paragraph", |b| {
        b.iter(|| divide_ngrams(black_box(&text)))
    });
}

criterion_group!(benches, bench_divide_ngrams);
criterion_main!(benches);
