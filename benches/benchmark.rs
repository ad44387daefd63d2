use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;

use logsai::index::VectorIndex;
use logsai::router::rank_issues;
use logsai::vector_entry::LogLine;

const SEED: u64 = 42;
const DIMENSIONS: usize = 1536;
const TOP_K: usize = 5;

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(10)
        .warm_up_time(std::time::Duration::from_secs(2))
        .configure_from_args()
}

fn random_vectors(rng: &mut StdRng, count: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|_| (0..DIMENSIONS).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

fn exact_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact search");

    for &size in &[1_000usize, 10_000] {
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut index = VectorIndex::new(DIMENSIONS);
        let texts = (0..size).map(|i| format!("line {i}")).collect();
        index.insert(random_vectors(&mut rng, size), texts).unwrap();
        let queries = random_vectors(&mut rng, 10);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                for query in &queries {
                    let results = index.search(query, TOP_K).unwrap();
                    assert_eq!(results.len(), TOP_K);
                }
            })
        });
    }

    group.finish();
}

fn frequency_ranking(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(SEED);
    let logs: Vec<LogLine> = (0..100_000)
        .map(|index| LogLine {
            index,
            content: format!("ERROR code {}", rng.gen_range(0..500)),
        })
        .collect();

    c.bench_function("rank top 10 of 100k lines", |b| {
        b.iter(|| rank_issues(&logs, 10))
    });
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = exact_search, frequency_ranking
}
criterion_main!(benches);
