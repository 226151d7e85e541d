use crate::algorithms::{RatingPredictor, Snapshot};
use crate::models::{FilmId, Recommendation, UserId};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Orders by predicted score descending, then film id ascending.
pub fn compare_candidates(a: &(FilmId, f64), b: &(FilmId, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Top `count` films the user has not rated, by predicted score.
///
/// Candidates without a defined prediction are dropped, so the result may be
/// shorter than `count` or empty.
pub fn rank(
    predictor: &dyn RatingPredictor,
    snapshot: &Snapshot,
    user_id: UserId,
    count: usize,
) -> Vec<Recommendation> {
    if count == 0 {
        return Vec::new();
    }

    let candidates = snapshot.matrix.unrated_films(user_id);
    let mut scored: Vec<(FilmId, f64)> = candidates
        .par_iter()
        .filter_map(|&film_id| {
            predictor
                .predict(snapshot, user_id, film_id)
                .map(|prediction| (film_id, prediction.score))
        })
        .collect();

    scored.sort_by(compare_candidates);
    scored.truncate(count);

    scored
        .into_iter()
        .enumerate()
        .map(|(position, (film_id, predicted_score))| Recommendation {
            film_id,
            predicted_score,
            rank: position + 1,
        })
        .collect()
}
