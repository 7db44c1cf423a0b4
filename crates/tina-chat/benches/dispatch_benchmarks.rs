//! Benchmarks for the synchronous parts of a turn.
//!
//! Classification, pronoun substitution, and expression evaluation run on
//! every utterance before any network adapter is touched, so they should
//! stay well under a millisecond.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use tina_chat::{math, resolve_pronouns, IntentRules};

/// Mix of utterances hitting every standard rule plus the fallback.
fn utterances() -> Vec<String> {
    let base = [
        "hello there",
        "tell me a joke",
        "give me a riddle",
        "any good quote?",
        "what is 12 * (3 + 4)",
        "what time is it",
        "who was ada lovelace",
        "tell me more about their work",
    ];
    (0..1000)
        .map(|i| format!("{} {}", base[i % base.len()], "please ".repeat(i % 4)))
        .collect()
}

fn bench_classification(c: &mut Criterion) {
    let inputs = utterances();
    let standard = IntentRules::standard();
    let basic = IntentRules::basic();

    let mut group = c.benchmark_group("classification");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("standard_rules", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let intent = standard.classify(&inputs[idx % inputs.len()]);
            idx += 1;
            intent
        });
    });

    group.bench_function("basic_rules", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let intent = basic.classify(&inputs[idx % inputs.len()]);
            idx += 1;
            intent
        });
    });

    group.finish();
}

fn bench_pronouns(c: &mut Criterion) {
    let inputs = utterances();

    let mut group = c.benchmark_group("pronouns");
    group.bench_function("resolve_with_entity", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let out = resolve_pronouns(&inputs[idx % inputs.len()], Some("Ada Lovelace"));
            idx += 1;
            out
        });
    });
    group.finish();
}

fn bench_math(c: &mut Criterion) {
    let expressions = [
        "2 + 2",
        "12 * (3 + 4) - 5 / 2",
        "sqrt(16) + 2 ** 10",
        "round(pi * 100, 2)",
        "factorial(20) // 7 % 13",
        "I have 3 cats",
    ];

    let mut group = c.benchmark_group("math");
    group.sample_size(200);
    group.bench_function("evaluate_mixed", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let result = math::evaluate(expressions[idx % expressions.len()]);
            idx += 1;
            result
        });
    });
    group.finish();
}

criterion_group!(benches, bench_classification, bench_pronouns, bench_math);
criterion_main!(benches);
