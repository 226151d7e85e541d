pub mod matrix;
pub mod predictor;
pub mod ranker;
pub mod similarity;

use crate::config::{RecommendationConfig, Strategy};
use crate::models::{FilmId, Score, UserId};
use chrono::{DateTime, Utc};
use matrix::RatingMatrix;
use predictor::{ItemBasedPredictor, PredictorOptions, UserBasedPredictor};
use similarity::SimilarityCache;
use std::sync::Arc;
use uuid::Uuid;

/// Immutable matrix build plus the similarities memoised against it.
#[derive(Debug)]
pub struct Snapshot {
    pub version: Uuid,
    pub built_at: DateTime<Utc>,
    pub matrix: RatingMatrix,
    pub similarities: SimilarityCache,
}

impl Snapshot {
    pub fn new(matrix: RatingMatrix) -> Self {
        Self {
            version: Uuid::new_v4(),
            built_at: Utc::now(),
            matrix,
            similarities: SimilarityCache::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub score: f64,
    /// Neighbours that contributed to the estimate.
    pub neighbours: usize,
    /// The user already rated the film and `score` is that rating.
    pub observed: bool,
}

impl Prediction {
    pub fn observed(score: Score) -> Self {
        Self {
            score: score as f64,
            neighbours: 0,
            observed: true,
        }
    }

    pub fn estimated(score: f64, neighbours: usize) -> Self {
        Self {
            score,
            neighbours,
            observed: false,
        }
    }
}

pub trait RatingPredictor: Send + Sync {
    /// Estimated score of `film_id` for `user_id`, `None` without evidence.
    fn predict(&self, snapshot: &Snapshot, user_id: UserId, film_id: FilmId) -> Option<Prediction>;
}

pub fn build_predictor(config: &RecommendationConfig) -> Arc<dyn RatingPredictor> {
    let options = PredictorOptions {
        scale: config.scale(),
        weighting: config.weighting,
        min_support: config.min_support,
    };

    match config.strategy {
        Strategy::UserBased => Arc::new(UserBasedPredictor::new(options)),
        Strategy::ItemBased => Arc::new(ItemBasedPredictor::new(options)),
    }
}
