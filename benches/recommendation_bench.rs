use criterion::{black_box, criterion_group, criterion_main, Criterion};
use filmrec::algorithms::matrix::RatingMatrix;
use filmrec::algorithms::predictor::{ItemBasedPredictor, UserBasedPredictor};
use filmrec::algorithms::ranker::rank;
use filmrec::algorithms::similarity::user_similarity;
use filmrec::algorithms::Snapshot;
use filmrec::services::recommendation::RecommendationService;
use filmrec::services::store::InMemoryRatingStore;
use filmrec::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn synthetic_ratings(users: i64, films: i64, density: f64) -> Vec<Rating> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut ratings = Vec::new();
    for user in 1..=users {
        for film in 1..=films {
            if rng.gen_bool(density) {
                ratings.push(Rating::new(user, film, rng.gen_range(1..=5)));
            }
        }
    }
    ratings
}

fn benchmark_matrix(c: &mut Criterion) {
    let ratings = synthetic_ratings(500, 400, 0.05);

    c.bench_function("rating_matrix_build", |b| {
        b.iter(|| black_box(RatingMatrix::build(ratings.iter().copied())));
    });

    let matrix = RatingMatrix::build(ratings);
    c.bench_function("user_similarity", |b| {
        b.iter(|| black_box(user_similarity(&matrix, black_box(1), black_box(2))));
    });
}

fn benchmark_ranking(c: &mut Criterion) {
    let ratings = synthetic_ratings(300, 200, 0.08);

    c.bench_function("rank_user_based_cold_cache", |b| {
        b.iter_batched(
            || Snapshot::new(RatingMatrix::build(ratings.iter().copied())),
            |snapshot| black_box(rank(&UserBasedPredictor::default(), &snapshot, 1, 10)),
            criterion::BatchSize::LargeInput,
        );
    });

    let snapshot = Snapshot::new(RatingMatrix::build(ratings.iter().copied()));
    rank(&UserBasedPredictor::default(), &snapshot, 1, 10);
    c.bench_function("rank_user_based_warm_cache", |b| {
        b.iter(|| black_box(rank(&UserBasedPredictor::default(), &snapshot, 1, 10)));
    });

    c.bench_function("rank_item_based", |b| {
        b.iter(|| black_box(rank(&ItemBasedPredictor::default(), &snapshot, 1, 10)));
    });
}

fn benchmark_service(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = rt.block_on(async {
        let seed = SeedData {
            ratings: synthetic_ratings(300, 200, 0.08),
            ..SeedData::default()
        };
        let store = Arc::new(InMemoryRatingStore::from_seed(seed).await);
        let service = RecommendationService::new(store, Arc::new(Config::default()));
        service.refresh().await.unwrap();
        service
    });

    let service = &service;
    c.bench_function("service_recommend", |b| {
        b.to_async(&rt).iter(|| async move {
            black_box(service.recommend(1, 10).await.unwrap());
        });
    });

    c.bench_function("service_refresh", |b| {
        b.to_async(&rt).iter(|| async move {
            black_box(service.refresh().await.unwrap());
        });
    });
}

criterion_group!(benches, benchmark_matrix, benchmark_ranking, benchmark_service);
criterion_main!(benches);
