use crate::algorithms::matrix::{RatingMatrix, RatingRow};
use crate::models::{FilmId, UserId};
use crate::utils::{cosine_similarity, pearson_correlation};
use dashmap::DashMap;
use nalgebra::DVector;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Pearson,
    /// Used when the co-rated vectors have no variance (including a single overlap).
    Cosine,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Similarity {
    pub score: f64,
    /// Number of co-rated entries the score rests on.
    pub support: usize,
    pub measure: Measure,
}

/// Similarity of two rating rows over their shared keys.
///
/// `None` means no overlap, i.e. no evidence either way. Keys are visited in
/// ascending order whichever row is scanned, so `similarity(a, b)` and
/// `similarity(b, a)` perform the same arithmetic.
pub fn similarity<K>(a: &RatingRow<K>, b: &RatingRow<K>) -> Option<Similarity>
where
    K: Ord,
{
    let (small, large, small_is_a) = if a.len() <= b.len() {
        (a, b, true)
    } else {
        (b, a, false)
    };

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (key, &small_score) in small {
        if let Some(&large_score) = large.get(key) {
            let (x, y) = if small_is_a {
                (small_score, large_score)
            } else {
                (large_score, small_score)
            };
            xs.push(x as f64);
            ys.push(y as f64);
        }
    }

    if xs.is_empty() {
        return None;
    }

    let support = xs.len();
    let x = DVector::from_vec(xs);
    let y = DVector::from_vec(ys);

    let similarity = match pearson_correlation(&x, &y) {
        Some(score) => Similarity {
            score,
            support,
            measure: Measure::Pearson,
        },
        None => Similarity {
            score: cosine_similarity(&x, &y),
            support,
            measure: Measure::Cosine,
        },
    };
    Some(similarity)
}

/// Similarity of two users over the films both rated.
pub fn user_similarity(matrix: &RatingMatrix, a: UserId, b: UserId) -> Option<Similarity> {
    similarity(matrix.ratings_of(a), matrix.ratings_of(b))
}

/// Similarity of two films over the users who rated both.
pub fn film_similarity(matrix: &RatingMatrix, a: FilmId, b: FilmId) -> Option<Similarity> {
    similarity(matrix.raters_of(a), matrix.raters_of(b))
}

fn pair_key(a: i64, b: i64) -> (i64, i64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Memoised similarities for one matrix snapshot, safe to share across threads.
///
/// The cache is owned by the snapshot it was filled from; a rebuilt snapshot
/// starts empty.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    users: DashMap<(UserId, UserId), Option<Similarity>>,
    films: DashMap<(FilmId, FilmId), Option<Similarity>>,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_similarity(&self, matrix: &RatingMatrix, a: UserId, b: UserId) -> Option<Similarity> {
        let key = pair_key(a, b);
        if let Some(hit) = self.users.get(&key) {
            return *hit;
        }
        let computed = user_similarity(matrix, key.0, key.1);
        self.users.insert(key, computed);
        computed
    }

    pub fn film_similarity(&self, matrix: &RatingMatrix, a: FilmId, b: FilmId) -> Option<Similarity> {
        let key = pair_key(a, b);
        if let Some(hit) = self.films.get(&key) {
            return *hit;
        }
        let computed = film_similarity(matrix, key.0, key.1);
        self.films.insert(key, computed);
        computed
    }

    pub fn len(&self) -> usize {
        self.users.len() + self.films.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
