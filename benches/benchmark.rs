// Performance benchmarks for the retrieval and ranking hot paths
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use std::sync::Arc;
use tailor::prelude::*;
use tailor::{KnowledgeEntry, Vector};

const COLOURS: [&str; 6] = ["red", "blue", "black", "white", "green", "navy blue"];
const TYPES: [&str; 6] = ["dress", "dresses", "shirts", "jeans", "tshirts", "tops"];
const USAGES: [&str; 3] = ["casual", "formal", "party"];

fn generate_random_vector(rng: &mut impl Rng, dim: usize) -> Vector {
    let data: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
    Vector::new(data).normalized()
}

fn generate_catalog(size: usize) -> Vec<CatalogRecord> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..size)
        .map(|i| CatalogRecord {
            id: i as u64,
            gender: if i % 2 == 0 { "women" } else { "men" }.to_string(),
            article_type: TYPES[rng.random_range(0..TYPES.len())].to_string(),
            usage: USAGES[rng.random_range(0..USAGES.len())].to_string(),
            season: "summer".to_string(),
            base_colour: vec![COLOURS[rng.random_range(0..COLOURS.len())].to_string()],
            material: None,
            display_name: None,
            image_path: format!("images/{}.jpg", i),
        })
        .collect()
}

fn generate_index(size: usize, dim: usize) -> KnowledgeIndex {
    let mut rng = StdRng::seed_from_u64(11);
    let entries = (0..size)
        .map(|i| {
            KnowledgeEntry::new(generate_random_vector(&mut rng, dim))
                .with_colors([COLOURS[i % COLOURS.len()]])
                .with_styles([TYPES[i % TYPES.len()]])
        })
        .collect();
    KnowledgeIndex::from_entries(dim, "bench", entries).unwrap()
}

fn benchmark_score_and_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_and_rank");
    let filter = StructuredFilter::new()
        .with_colors(["red", "black"])
        .with_styles(["dress"])
        .with_usage(Some("party"));
    let scorer = Scorer::default();

    for size in [1_000, 10_000, 50_000].iter() {
        let catalog = generate_catalog(*size);
        group.bench_with_input(BenchmarkId::new("tailor", size), size, |b, _| {
            b.iter(|| black_box(scorer.score_and_rank(&catalog, &filter, 10).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_index_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_search");
    let mut rng = StdRng::seed_from_u64(3);

    for size in [500, 5_000, 20_000].iter() {
        let index = generate_index(*size, 384);
        let query = generate_random_vector(&mut rng, 384);
        group.bench_with_input(BenchmarkId::new("tailor", size), size, |b, _| {
            b.iter(|| black_box(index.search(&query, 2).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_parse_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_query");
    let encoder: Arc<dyn Encoder> = Arc::new(HashingEncoder::new(384).unwrap());
    let sources: Vec<KnowledgeSource> = (0..2_000)
        .map(|i| KnowledgeSource {
            text: format!(
                "a {} {} for {} occasions, entry {}",
                COLOURS[i % COLOURS.len()],
                TYPES[i % TYPES.len()],
                USAGES[i % USAGES.len()],
                i
            ),
            colors: vec![COLOURS[i % COLOURS.len()].to_string()],
            styles: vec![TYPES[i % TYPES.len()].to_string()],
            ..Default::default()
        })
        .collect();
    let index = KnowledgeBuilder::new(encoder.clone()).build(&sources).unwrap();
    let parser = QueryParser::new(Arc::new(index), encoder).unwrap();

    group.bench_function("tailor", |b| {
        b.iter(|| black_box(parser.parse_query("red party dress for a summer evening", 2, 1.0).unwrap()));
    });

    group.finish();
}

fn benchmark_concurrent_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_ranking");
    let catalog: Arc<[CatalogRecord]> = generate_catalog(10_000).into();
    let filter = Arc::new(StructuredFilter::new().with_colors(["red"]).with_styles(["dress"]));

    group.bench_function("tailor_concurrent", |b| {
        b.iter(|| {
            use std::thread;
            let handles: Vec<_> = (0..10)
                .map(|_| {
                    let catalog = catalog.clone();
                    let filter = filter.clone();
                    thread::spawn(move || {
                        Scorer::default()
                            .score_and_rank(&catalog, &filter, 10)
                            .map(|ranked| ranked.len())
                    })
                })
                .collect();

            for handle in handles {
                black_box(handle.join().unwrap().unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_score_and_rank,
    benchmark_index_search,
    benchmark_parse_query,
    benchmark_concurrent_ranking
);
criterion_main!(benches);
