use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scorecraft_core::formula::validate;

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    let simple = "accuracy * 0.5 + speed * 0.5";
    let nested = "clamp(if(accuracy > 90, speed * 1.2, speed), 0, 100) + sqrt(abs(hits - misses))";
    let wide = {
        let terms: Vec<String> = (0..100).map(|i| format!("v{i} * 0.01")).collect();
        terms.join(" + ")
    };

    group.bench_function("simple", |b| b.iter(|| validate(black_box(simple))));
    group.bench_function("nested_calls", |b| b.iter(|| validate(black_box(nested))));
    group.bench_function("100_terms", |b| b.iter(|| validate(black_box(&wide))));

    group.finish();
}

fn bench_variable_census(c: &mut Criterion) {
    let formula =
        validate("accuracy * 0.4 + speed * 0.3 + consistency * 0.2 + min(hits, misses) * 0.1")
            .unwrap();

    c.bench_function("variables", |b| b.iter(|| black_box(&formula).variables()));
}

criterion_group!(benches, bench_validate, bench_variable_census);
criterion_main!(benches);
