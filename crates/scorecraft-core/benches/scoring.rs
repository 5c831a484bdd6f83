use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scorecraft_core::eval::{evaluate, test_formula};
use scorecraft_core::formula::validate;
use scorecraft_core::model::{ScoringConfiguration, VariableEnvironment};
use scorecraft_core::scoring::score_with_environment;

fn bench_env() -> VariableEnvironment {
    let mut env = VariableEnvironment::new();
    env.insert("accuracy", 82.5).unwrap();
    env.insert("speed", 61.0).unwrap();
    env.insert("consistency", 74.0).unwrap();
    env.insert("hits", 40.0).unwrap();
    env.insert("misses", 10.0).unwrap();
    env
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let env = bench_env();

    let simple = validate("accuracy * 0.5 + speed * 0.5").unwrap();
    let nested =
        validate("clamp(if(accuracy > 90, speed * 1.2, speed), 0, 100) + sqrt(abs(hits - misses))")
            .unwrap();

    group.bench_function("simple", |b| {
        b.iter(|| evaluate(black_box(&simple), black_box(&env)))
    });
    group.bench_function("nested_calls", |b| {
        b.iter(|| evaluate(black_box(&nested), black_box(&env)))
    });
    group.bench_function("validate_and_evaluate", |b| {
        b.iter(|| test_formula(black_box("accuracy * 0.5 + speed * 0.5"), black_box(&env)))
    });

    group.finish();
}

fn bench_full_scoring(c: &mut Criterion) {
    let env = bench_env();
    let competencies = ["precision", "reflex", "stamina", "focus", "recall"];

    let config = ScoringConfiguration {
        game_type: "reaction_sprint".into(),
        competency_formulas: competencies
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    "accuracy * 0.4 + speed * 0.4 + consistency * 0.2".to_string(),
                )
            })
            .collect(),
        final_weights: competencies
            .iter()
            .map(|name| (name.to_string(), 0.2))
            .collect(),
        settings: BTreeMap::new(),
    };

    c.bench_function("score_5_competencies", |b| {
        b.iter(|| score_with_environment(black_box(&config), black_box(&env)))
    });
}

criterion_group!(benches, bench_evaluate, bench_full_scoring);
criterion_main!(benches);
