use crate::algorithms::similarity::Similarity;
use crate::algorithms::{Prediction, RatingPredictor, Snapshot};
use crate::config::WeightingMode;
use crate::models::{FilmId, RatingScale, UserId};
use crate::utils::{weighted_mean, DEGENERATE_NORM};

#[derive(Debug, Clone, Copy)]
pub struct PredictorOptions {
    pub scale: RatingScale,
    pub weighting: WeightingMode,
    pub min_support: usize,
}

impl Default for PredictorOptions {
    fn default() -> Self {
        Self {
            scale: RatingScale::default(),
            weighting: WeightingMode::PositiveOnly,
            min_support: 1,
        }
    }
}

impl PredictorOptions {
    /// Weight a neighbour contributes, or `None` if it must be discarded.
    fn weight(&self, similarity: Option<Similarity>) -> Option<f64> {
        let similarity = similarity?;
        if similarity.support < self.min_support {
            return None;
        }
        match self.weighting {
            WeightingMode::PositiveOnly if similarity.score > 0.0 => Some(similarity.score),
            WeightingMode::Signed if similarity.score != 0.0 => Some(similarity.score),
            _ => None,
        }
    }

    /// Combines `(value, weight)` neighbour evidence into a clamped score.
    ///
    /// Positive-only weighting averages raw scores. Signed weighting averages
    /// deviations from each neighbour's mean and re-centres them on `baseline`.
    fn aggregate(&self, neighbours: &[(f64, f64)], baseline: Option<f64>) -> Option<f64> {
        if neighbours.is_empty() {
            return None;
        }
        let raw = match self.weighting {
            WeightingMode::PositiveOnly => weighted_mean(neighbours.iter().copied())?,
            WeightingMode::Signed => {
                let numerator: f64 = neighbours.iter().map(|(dev, w)| dev * w).sum();
                let denominator: f64 = neighbours.iter().map(|(_, w)| w.abs()).sum();
                if denominator < DEGENERATE_NORM {
                    return None;
                }
                baseline? + numerator / denominator
            }
        };
        Some(self.scale.clamp(raw))
    }
}

/// Predicts from the scores that similar users gave the target film.
#[derive(Debug, Clone, Default)]
pub struct UserBasedPredictor {
    options: PredictorOptions,
}

impl UserBasedPredictor {
    pub fn new(options: PredictorOptions) -> Self {
        Self { options }
    }
}

impl RatingPredictor for UserBasedPredictor {
    fn predict(&self, snapshot: &Snapshot, user_id: UserId, film_id: FilmId) -> Option<Prediction> {
        let matrix = &snapshot.matrix;
        if let Some(score) = matrix.rating(user_id, film_id) {
            return Some(Prediction::observed(score));
        }

        let mut neighbours = Vec::new();
        for (&rater, &score) in matrix.raters_of(film_id) {
            if rater == user_id {
                continue;
            }
            let similarity = snapshot.similarities.user_similarity(matrix, user_id, rater);
            let Some(weight) = self.options.weight(similarity) else {
                continue;
            };
            let value = match self.options.weighting {
                WeightingMode::PositiveOnly => score as f64,
                WeightingMode::Signed => score as f64 - matrix.user_mean(rater)?,
            };
            neighbours.push((value, weight));
        }

        let score = self.options.aggregate(&neighbours, matrix.user_mean(user_id))?;
        Some(Prediction::estimated(score, neighbours.len()))
    }
}

/// Predicts from the user's own scores on films similar to the target film.
#[derive(Debug, Clone, Default)]
pub struct ItemBasedPredictor {
    options: PredictorOptions,
}

impl ItemBasedPredictor {
    pub fn new(options: PredictorOptions) -> Self {
        Self { options }
    }
}

impl RatingPredictor for ItemBasedPredictor {
    fn predict(&self, snapshot: &Snapshot, user_id: UserId, film_id: FilmId) -> Option<Prediction> {
        let matrix = &snapshot.matrix;
        if let Some(score) = matrix.rating(user_id, film_id) {
            return Some(Prediction::observed(score));
        }

        let mut neighbours = Vec::new();
        for (&rated_film, &score) in matrix.ratings_of(user_id) {
            let similarity = snapshot.similarities.film_similarity(matrix, film_id, rated_film);
            let Some(weight) = self.options.weight(similarity) else {
                continue;
            };
            let value = match self.options.weighting {
                WeightingMode::PositiveOnly => score as f64,
                WeightingMode::Signed => score as f64 - matrix.film_mean(rated_film)?,
            };
            neighbours.push((value, weight));
        }

        let score = self.options.aggregate(&neighbours, matrix.film_mean(film_id))?;
        Some(Prediction::estimated(score, neighbours.len()))
    }
}
