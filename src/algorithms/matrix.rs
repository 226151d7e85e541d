use crate::models::{FilmId, Rating, Score, UserId};
use std::collections::{BTreeMap, BTreeSet};

/// Ratings of one user (keyed by film) or of one film (keyed by user).
pub type RatingRow<K> = BTreeMap<K, Score>;

static EMPTY_USER_ROW: RatingRow<FilmId> = BTreeMap::new();
static EMPTY_FILM_ROW: RatingRow<UserId> = BTreeMap::new();

/// Sparse user x film rating matrix with both orientations.
///
/// Both views are filled from the same deduplicated rating set in one pass
/// and never mutated afterwards. Ordered maps keep every traversal in id
/// order, so floating point sums do not depend on hashing.
#[derive(Debug, Clone, Default)]
pub struct RatingMatrix {
    by_user: BTreeMap<UserId, RatingRow<FilmId>>,
    by_film: BTreeMap<FilmId, RatingRow<UserId>>,
    rating_count: usize,
}

impl RatingMatrix {
    /// Builds the matrix from ratings in sequence order. A later rating for
    /// the same (user, film) pair supersedes the earlier one.
    pub fn build<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = Rating>,
    {
        let mut by_user: BTreeMap<UserId, RatingRow<FilmId>> = BTreeMap::new();
        for rating in ratings {
            by_user
                .entry(rating.user_id)
                .or_default()
                .insert(rating.film_id, rating.score);
        }

        let mut by_film: BTreeMap<FilmId, RatingRow<UserId>> = BTreeMap::new();
        let mut rating_count = 0;
        for (&user_id, row) in &by_user {
            for (&film_id, &score) in row {
                by_film.entry(film_id).or_default().insert(user_id, score);
                rating_count += 1;
            }
        }

        Self {
            by_user,
            by_film,
            rating_count,
        }
    }

    /// Registers catalog users and films that may have no ratings yet.
    pub fn with_catalog<U, F>(mut self, users: U, films: F) -> Self
    where
        U: IntoIterator<Item = UserId>,
        F: IntoIterator<Item = FilmId>,
    {
        for user_id in users {
            self.by_user.entry(user_id).or_default();
        }
        for film_id in films {
            self.by_film.entry(film_id).or_default();
        }
        self
    }

    pub fn ratings_of(&self, user_id: UserId) -> &RatingRow<FilmId> {
        self.by_user.get(&user_id).unwrap_or(&EMPTY_USER_ROW)
    }

    pub fn raters_of(&self, film_id: FilmId) -> &RatingRow<UserId> {
        self.by_film.get(&film_id).unwrap_or(&EMPTY_FILM_ROW)
    }

    pub fn rating(&self, user_id: UserId, film_id: FilmId) -> Option<Score> {
        self.by_user.get(&user_id)?.get(&film_id).copied()
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.by_user.contains_key(&user_id)
    }

    /// Known users in ascending id order.
    pub fn all_users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.by_user.keys().copied()
    }

    /// Known films in ascending id order.
    pub fn all_films(&self) -> impl Iterator<Item = FilmId> + '_ {
        self.by_film.keys().copied()
    }

    /// Films the user has not rated, in ascending id order.
    pub fn unrated_films(&self, user_id: UserId) -> Vec<FilmId> {
        let rated: BTreeSet<FilmId> = self.ratings_of(user_id).keys().copied().collect();
        self.all_films().filter(|film| !rated.contains(film)).collect()
    }

    /// Mean score of a user, `None` when they rated nothing.
    pub fn user_mean(&self, user_id: UserId) -> Option<f64> {
        mean(self.ratings_of(user_id))
    }

    pub fn film_mean(&self, film_id: FilmId) -> Option<f64> {
        mean(self.raters_of(film_id))
    }

    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    pub fn film_count(&self) -> usize {
        self.by_film.len()
    }

    pub fn rating_count(&self) -> usize {
        self.rating_count
    }
}

fn mean<K>(row: &RatingRow<K>) -> Option<f64> {
    if row.is_empty() {
        return None;
    }
    let total: f64 = row.values().map(|&s| s as f64).sum();
    Some(total / row.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RatingMatrix {
        RatingMatrix::build(vec![
            Rating::new(1, 10, 5),
            Rating::new(1, 20, 3),
            Rating::new(2, 10, 4),
        ])
    }

    #[test]
    fn test_both_orientations_agree() {
        let matrix = sample();
        for user in matrix.all_users() {
            for (&film, &score) in matrix.ratings_of(user) {
                assert_eq!(matrix.raters_of(film).get(&user), Some(&score));
            }
        }
        assert_eq!(matrix.rating_count(), 3);
        assert_eq!(matrix.raters_of(10).len(), 2);
    }

    #[test]
    fn test_later_rating_supersedes() {
        let matrix = RatingMatrix::build(vec![
            Rating::new(1, 10, 2),
            Rating::new(1, 10, 5),
        ]);
        assert_eq!(matrix.rating(1, 10), Some(5));
        assert_eq!(matrix.raters_of(10).get(&1), Some(&5));
        assert_eq!(matrix.rating_count(), 1);
    }

    #[test]
    fn test_missing_rows_are_empty() {
        let matrix = sample();
        assert!(matrix.ratings_of(99).is_empty());
        assert!(matrix.raters_of(99).is_empty());
        assert!(!matrix.contains_user(99));
        assert_eq!(matrix.user_mean(99), None);
    }

    #[test]
    fn test_catalog_entries_without_ratings() {
        let matrix = sample().with_catalog(vec![7], vec![30]);
        assert!(matrix.contains_user(7));
        assert!(matrix.ratings_of(7).is_empty());
        assert_eq!(matrix.all_films().collect::<Vec<_>>(), vec![10, 20, 30]);
        assert_eq!(matrix.unrated_films(1), vec![30]);
        assert_eq!(matrix.unrated_films(7), vec![10, 20, 30]);
    }

    #[test]
    fn test_means() {
        let matrix = sample();
        assert_eq!(matrix.user_mean(1), Some(4.0));
        assert_eq!(matrix.film_mean(10), Some(4.5));
    }
}
