use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::Rng;
use shrike::embedding::Embedding;
use shrike::index::store::NewEntry;
use shrike::index::{IndexConfig, VectorIndex};
use shrike::search::SearchParams;
use shrike::storage::memory::MemoryStorage;

const DIMENSION: usize = 128;

fn random_embedding(rng: &mut impl Rng) -> Embedding {
    Embedding::new((0..DIMENSION).map(|_| rng.random::<f32>() * 2.0 - 1.0).collect())
}

fn build_index(entry_count: usize) -> VectorIndex {
    let mut rng = rand::rng();
    let storage = Arc::new(MemoryStorage::new());
    let index = VectorIndex::create(storage, IndexConfig::with_dimension(DIMENSION))
        .expect("create index");

    let batch: Vec<NewEntry> = (0..entry_count)
        .map(|i| NewEntry::new(random_embedding(&mut rng), format!("entry-{i}").into_bytes()))
        .collect();
    index.index(batch).expect("index entries");
    index
}

fn bench_search(c: &mut Criterion) {
    let mut rng = rand::rng();
    let index = build_index(10000);
    let queries: Vec<Embedding> = (0..64).map(|_| random_embedding(&mut rng)).collect();
    let params = SearchParams {
        top_k: 10,
        include_embeddings: false,
    };

    let mut group = c.benchmark_group("search_10k");
    group.sample_size(20);

    for batch_size in [1, 16, 64] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_function(BenchmarkId::from_parameter(batch_size), |b| {
            b.iter(|| {
                index
                    .search(black_box(&queries[..batch_size]), black_box(&params))
                    .expect("search")
            })
        });
    }

    group.finish();
}

fn bench_top_k_sweep(c: &mut Criterion) {
    let mut rng = rand::rng();
    let index = build_index(10000);
    let queries: Vec<Embedding> = (0..4).map(|_| random_embedding(&mut rng)).collect();

    let mut group = c.benchmark_group("search_top_k");
    group.sample_size(20);

    for top_k in [1, 10, 100] {
        let params = SearchParams {
            top_k,
            include_embeddings: false,
        };
        group.bench_function(BenchmarkId::from_parameter(top_k), |b| {
            b.iter(|| {
                index
                    .search(black_box(&queries), black_box(&params))
                    .expect("search")
            })
        });
    }

    group.finish();
}

fn bench_ingest(c: &mut Criterion) {
    let mut rng = rand::rng();
    let batch: Vec<NewEntry> = (0..1000)
        .map(|i| NewEntry::new(random_embedding(&mut rng), format!("entry-{i}").into_bytes()))
        .collect();

    let mut group = c.benchmark_group("ingest");
    group.sample_size(10);
    group.throughput(Throughput::Elements(batch.len() as u64));

    group.bench_function("batch_1000", |b| {
        b.iter(|| {
            let storage = Arc::new(MemoryStorage::new());
            let index = VectorIndex::create(storage, IndexConfig::with_dimension(DIMENSION))
                .expect("create index");
            index.index(black_box(batch.clone())).expect("index entries");
        })
    });

    group.finish();
}

criterion_group!(benches, bench_search, bench_top_k_sweep, bench_ingest);
criterion_main!(benches);
