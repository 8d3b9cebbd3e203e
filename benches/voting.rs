use barbell_ensemble::ensemble::{
    AccuracyTable, ClassifierId, Label, PredictionMatrix, WeightedVoteAggregator,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const CLASSES: [&str; 5] = ["A", "B", "C", "D", "E"];

fn random_predictions(n_samples: usize, n_classifiers: usize) -> (PredictionMatrix, AccuracyTable) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let columns: Vec<(ClassifierId, Vec<Label>)> = (0..n_classifiers)
        .map(|j| {
            let labels = (0..n_samples)
                .map(|_| Label::from(CLASSES[rng.gen_range(0..CLASSES.len())]))
                .collect();
            (ClassifierId::new(format!("model_{}", j)), labels)
        })
        .collect();
    let accuracies = AccuracyTable::from_pairs(
        columns
            .iter()
            .map(|(id, _)| (id.clone(), rng.gen_range(0.5..1.0)))
            .collect::<Vec<_>>(),
    )
    .unwrap();

    (PredictionMatrix::from_columns(columns).unwrap(), accuracies)
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for n_samples in [1_000, 10_000, 100_000].iter() {
        let (matrix, accuracies) = random_predictions(*n_samples, 5);
        let aggregator = WeightedVoteAggregator::new();

        group.bench_with_input(
            BenchmarkId::new("samples", n_samples),
            &matrix,
            |b, matrix| {
                b.iter(|| {
                    aggregator
                        .aggregate(black_box(matrix), black_box(&accuracies), None)
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_classifier_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifiers");

    for n_classifiers in [3, 10, 30].iter() {
        let (matrix, accuracies) = random_predictions(10_000, *n_classifiers);
        let aggregator = WeightedVoteAggregator::new();

        group.bench_with_input(
            BenchmarkId::new("count", n_classifiers),
            &matrix,
            |b, matrix| {
                b.iter(|| {
                    aggregator
                        .aggregate(black_box(matrix), black_box(&accuracies), None)
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_classifier_count);
criterion_main!(benches);
