use crate::algorithms::matrix::RatingMatrix;
use crate::algorithms::{build_predictor, ranker, RatingPredictor, Snapshot};
use crate::config::Config;
use crate::error::{RecommendError, RecommendResult};
use crate::models::*;
use crate::services::store::{RatingStore, StoreResult};
use crate::utils::validation::validate_rating;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Recommender facade.
///
/// Holds the current matrix snapshot behind an `Arc`. Readers clone the
/// `Arc` once per call and keep using it for the whole computation, while a
/// rebuild assembles a new snapshot off to the side and swaps the pointer.
pub struct RecommendationService {
    store: Arc<dyn RatingStore>,
    predictor: Arc<dyn RatingPredictor>,
    config: Arc<Config>,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    build_lock: tokio::sync::Mutex<()>,
    stale: AtomicBool,
    serving_stats: DashMap<String, u64>,
    latency: Mutex<LatencyStats>,
}

#[derive(Debug, Default)]
struct LatencyStats {
    served: u64,
    total_ms: u64,
    max_ms: u64,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn RatingStore>, config: Arc<Config>) -> Self {
        let predictor = build_predictor(&config.recommendation);
        Self::with_predictor(store, predictor, config)
    }

    pub fn with_predictor(
        store: Arc<dyn RatingStore>,
        predictor: Arc<dyn RatingPredictor>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            predictor,
            config,
            snapshot: RwLock::new(None),
            build_lock: tokio::sync::Mutex::new(()),
            stale: AtomicBool::new(false),
            serving_stats: DashMap::new(),
            latency: Mutex::new(LatencyStats::default()),
        }
    }

    pub fn store(&self) -> &Arc<dyn RatingStore> {
        &self.store
    }

    pub fn current_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().clone()
    }

    /// Rebuilds the matrix from the store and swaps it in.
    ///
    /// On failure the previous snapshot, if any, stays in place and the
    /// error is returned as `DataUnavailable`.
    pub async fn refresh(&self) -> RecommendResult<Arc<Snapshot>> {
        let _guard = self.build_lock.lock().await;
        self.rebuild().await
    }

    /// Marks the current snapshot as outdated; the next request that finds
    /// no build in progress rebuilds it.
    pub fn invalidate(&self) {
        self.stale.store(true, Ordering::SeqCst);
        debug!("Rating matrix snapshot invalidated");
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    async fn rebuild(&self) -> RecommendResult<Arc<Snapshot>> {
        let start_time = Instant::now();
        // cleared up front so invalidations arriving mid-build are kept
        self.stale.store(false, Ordering::SeqCst);

        match self.load_snapshot().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.snapshot.write() = Some(snapshot.clone());
                self.increment_stat("rebuilds");

                info!(
                    "Built rating matrix snapshot {} ({} users, {} films, {} ratings) in {}ms",
                    snapshot.version,
                    snapshot.matrix.user_count(),
                    snapshot.matrix.film_count(),
                    snapshot.matrix.rating_count(),
                    start_time.elapsed().as_millis()
                );
                Ok(snapshot)
            }
            Err(e) => {
                // retried by the next refresh or invalidation, not by reads
                self.increment_stat("failed_rebuilds");
                error!("Failed to build rating matrix snapshot: {}", e);
                Err(RecommendError::DataUnavailable(e))
            }
        }
    }

    async fn load_snapshot(&self) -> StoreResult<Snapshot> {
        let ratings = self.store.list_ratings().await?;
        let users = self.store.list_users().await?;
        let films = self.store.list_films().await?;

        let scale = self.config.recommendation.scale();
        let (ratings, rejected): (Vec<Rating>, Vec<Rating>) =
            ratings.into_iter().partition(|rating| scale.contains(rating.score));
        if !rejected.is_empty() {
            warn!(
                "Skipping {} stored ratings outside the {}..={} scale",
                rejected.len(),
                scale.min,
                scale.max
            );
            self.add_to_stat("rejected_ratings", rejected.len() as u64);
        }

        let matrix = RatingMatrix::build(ratings).with_catalog(
            users.iter().map(|user| user.id),
            films.iter().map(|film| film.id),
        );
        Ok(Snapshot::new(matrix))
    }

    /// Snapshot to serve one request from.
    ///
    /// Only the first load waits for a build. Once a snapshot exists, an
    /// invalidated one is rebuilt by the first request that finds the build
    /// lock free; everyone else keeps reading the current snapshot.
    async fn snapshot_for_request(&self) -> RecommendResult<Arc<Snapshot>> {
        if let Some(current) = self.current_snapshot() {
            if !self.is_stale() {
                return Ok(current);
            }
            let Ok(_guard) = self.build_lock.try_lock() else {
                return Ok(current);
            };
            // another request may have rebuilt before we got the lock
            if !self.is_stale() {
                return Ok(self.current_snapshot().unwrap_or(current));
            }

            return match self.rebuild().await {
                Ok(snapshot) => Ok(snapshot),
                Err(e) => {
                    warn!(
                        "Serving previous snapshot {} until the next refresh: {}",
                        current.version, e
                    );
                    Ok(current)
                }
            };
        }

        let _guard = self.build_lock.lock().await;
        if let Some(current) = self.current_snapshot() {
            return Ok(current);
        }
        self.rebuild().await
    }

    /// Ranked films for `user_id`, at most `count` of them.
    pub async fn recommend(&self, user_id: UserId, count: usize) -> RecommendResult<RecommendationResponse> {
        self.increment_stat("requests");
        let start_time = Instant::now();

        let result = self.recommend_inner(user_id, count).await;
        match &result {
            Ok(response) => {
                let latency = start_time.elapsed().as_millis() as u64;
                self.update_latency_stat(latency);
                info!(
                    "Served {} recommendations for user {} in {}ms",
                    response.recommendations.len(),
                    user_id,
                    latency
                );
            }
            Err(e) => {
                self.increment_stat("failed_requests");
                warn!("Recommendation for user {} failed: {}", user_id, e);
            }
        }
        result
    }

    async fn recommend_inner(&self, user_id: UserId, count: usize) -> RecommendResult<RecommendationResponse> {
        let snapshot = self.snapshot_for_request().await?;
        if !snapshot.matrix.contains_user(user_id) {
            return Err(RecommendError::UnknownUser(user_id));
        }

        let predictor = self.predictor.clone();
        let ranked_on = snapshot.clone();
        let recommendations = tokio::task::spawn_blocking(move || {
            ranker::rank(predictor.as_ref(), &ranked_on, user_id, count)
        })
        .await
        .map_err(|e| RecommendError::Internal(format!("ranking task failed: {}", e)))?;

        Ok(RecommendationResponse {
            user_id,
            recommendations,
            snapshot_version: snapshot.version,
            generated_at: Utc::now(),
        })
    }

    /// Validates and stores a rating, then invalidates the snapshot.
    pub async fn add_rating(&self, user_id: UserId, film_id: FilmId, score: i64) -> RecommendResult<Rating> {
        let rating = validate_rating(user_id, film_id, score, self.config.recommendation.scale())?;

        if self.store.get_user(user_id).await?.is_none() {
            return Err(RecommendError::UnknownUser(user_id));
        }
        if self.store.get_film(film_id).await?.is_none() {
            return Err(RecommendError::NotFound(format!("no film with id {}", film_id)));
        }

        self.store.add_rating(rating).await?;
        self.invalidate();
        Ok(rating)
    }

    /// Periodically rebuilds the snapshot; failures are logged and retried
    /// on the next tick.
    pub fn spawn_refresh_task(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = self.refresh().await {
                    warn!("Scheduled snapshot refresh failed, keeping previous snapshot: {}", e);
                }
            }
        })
    }

    pub fn get_serving_stats(&self) -> HashMap<String, u64> {
        let mut stats: HashMap<String, u64> = self
            .serving_stats
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        let latency = self.latency.lock();
        if latency.served > 0 {
            stats.insert("served".to_string(), latency.served);
            stats.insert("avg_latency_ms".to_string(), latency.total_ms / latency.served);
            stats.insert("max_latency_ms".to_string(), latency.max_ms);
        }
        stats
    }

    fn increment_stat(&self, key: &str) {
        self.add_to_stat(key, 1);
    }

    fn add_to_stat(&self, key: &str, amount: u64) {
        *self.serving_stats.entry(key.to_string()).or_insert(0) += amount;
    }

    fn update_latency_stat(&self, latency_ms: u64) {
        let mut latency = self.latency.lock();
        latency.served += 1;
        latency.total_ms += latency_ms;
        latency.max_ms = latency.max_ms.max(latency_ms);
    }
}
