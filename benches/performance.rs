/// Seeding and full-run benchmarks on a synthetic topic corpus.
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use topic_kmeans::{Geometry, KMeans, TermVector, VecCorpus, seed_clusters};

/// `count` topics drawn from `themes` disjoint vocabularies of 40 terms each.
fn synthetic_topics(count: usize, themes: usize) -> VecCorpus<TermVector> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|i| {
            let theme = rng.random_range(0..themes);
            let pairs: Vec<(String, f64)> = (0..12)
                .map(|_| {
                    let term = format!("t{theme}_{}", rng.random_range(0..40));
                    (term, rng.random_range(0.01..1.0))
                })
                .collect();
            #[allow(clippy::cast_possible_wrap)]
            let id = i as i64;
            TermVector::from_pairs(id, pairs)
        })
        .collect()
}

fn bench_seeding(c: &mut Criterion) {
    let corpus = synthetic_topics(2000, 20);
    c.bench_function("kmeanspp_seed_2k_topics_k50", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| {
            let clusters = seed_clusters(&corpus, 50, &mut rng).expect("seeding");
            black_box(clusters.len());
        });
    });
}

fn bench_spherical_run(c: &mut Criterion) {
    let template = synthetic_topics(1000, 10);
    c.bench_function("spherical_kmeans_1k_topics_k10", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        let kmeans = KMeans::new(10).with_geometry(Geometry::Spherical);
        b.iter(|| {
            let mut corpus = template.clone();
            let clustering = kmeans.fit(&mut corpus, &mut rng).expect("clustering");
            black_box(clustering.convergence());
        });
    });
}

criterion_group!(benches, bench_seeding, bench_spherical_run);
criterion_main!(benches);
