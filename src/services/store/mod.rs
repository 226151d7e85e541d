pub mod postgres;

use crate::error::StoreError;
use crate::models::*;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

pub use postgres::PgRatingStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Read side plus the single write the service performs.
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    async fn list_ratings(&self) -> StoreResult<Vec<Rating>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;
    async fn get_user_by_name(&self, name: &str) -> StoreResult<Option<User>>;
    async fn list_films(&self) -> StoreResult<Vec<Film>>;
    async fn get_film(&self, film_id: FilmId) -> StoreResult<Option<Film>>;
    async fn ratings_of_user(&self, user_id: UserId) -> StoreResult<WatchedList>;
    /// Inserts or replaces the rating for the (user, film) pair.
    async fn add_rating(&self, rating: Rating) -> StoreResult<()>;
}

/// Process-local store backed by ordered maps.
pub struct InMemoryRatingStore {
    users: RwLock<BTreeMap<UserId, User>>,
    films: RwLock<BTreeMap<FilmId, Film>>,
    ratings: RwLock<Vec<Rating>>,
    positions: RwLock<HashMap<(UserId, FilmId), usize>>,
}

impl InMemoryRatingStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            films: RwLock::new(BTreeMap::new()),
            ratings: RwLock::new(Vec::new()),
            positions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn from_seed(seed: SeedData) -> Self {
        let store = Self::new();
        {
            let mut users = store.users.write().await;
            for user in seed.users {
                users.insert(user.id, user);
            }
        }
        {
            let mut films = store.films.write().await;
            for film in seed.films {
                films.insert(film.id, film);
            }
        }
        for rating in seed.ratings {
            store.upsert(rating).await;
        }
        store
    }

    pub async fn from_seed_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let seed: SeedData = serde_json::from_str(&raw)?;
        info!(
            "Loaded seed file {} ({} users, {} films, {} ratings)",
            path.display(),
            seed.users.len(),
            seed.films.len(),
            seed.ratings.len()
        );
        Ok(Self::from_seed(seed).await)
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn insert_film(&self, film: Film) {
        self.films.write().await.insert(film.id, film);
    }

    async fn upsert(&self, rating: Rating) {
        let mut ratings = self.ratings.write().await;
        let mut positions = self.positions.write().await;
        match positions.get(&(rating.user_id, rating.film_id)) {
            Some(&index) => ratings[index] = rating,
            None => {
                positions.insert((rating.user_id, rating.film_id), ratings.len());
                ratings.push(rating);
            }
        }
    }
}

impl Default for InMemoryRatingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RatingStore for InMemoryRatingStore {
    async fn list_ratings(&self) -> StoreResult<Vec<Rating>> {
        Ok(self.ratings.read().await.clone())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn get_user_by_name(&self, name: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.name == name).cloned())
    }

    async fn list_films(&self) -> StoreResult<Vec<Film>> {
        Ok(self.films.read().await.values().cloned().collect())
    }

    async fn get_film(&self, film_id: FilmId) -> StoreResult<Option<Film>> {
        Ok(self.films.read().await.get(&film_id).cloned())
    }

    async fn ratings_of_user(&self, user_id: UserId) -> StoreResult<WatchedList> {
        let ratings = self.ratings.read().await;
        Ok(ratings
            .iter()
            .filter(|rating| rating.user_id == user_id)
            .map(|rating| (rating.film_id, rating.score))
            .collect())
    }

    async fn add_rating(&self, rating: Rating) -> StoreResult<()> {
        if !self.users.read().await.contains_key(&rating.user_id) {
            return Err(StoreError::InvalidData(format!("no user with id {}", rating.user_id)));
        }
        if !self.films.read().await.contains_key(&rating.film_id) {
            return Err(StoreError::InvalidData(format!("no film with id {}", rating.film_id)));
        }

        self.upsert(rating).await;
        info!(
            "Stored rating {} for user {} film {}",
            rating.score, rating.user_id, rating.film_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> SeedData {
        SeedData {
            users: vec![User::new(1, "ada"), User::new(2, "brian")],
            films: vec![Film::new(10, "Alien").with_year(1979), Film::new(20, "Heat")],
            ratings: vec![Rating::new(1, 10, 4), Rating::new(2, 20, 2)],
        }
    }

    #[tokio::test]
    async fn test_lookup_users() {
        let store = InMemoryRatingStore::from_seed(seed()).await;
        assert_eq!(store.get_user(1).await.unwrap(), Some(User::new(1, "ada")));
        assert_eq!(store.get_user(9).await.unwrap(), None);
        assert_eq!(store.get_user_by_name("brian").await.unwrap().map(|u| u.id), Some(2));
        assert_eq!(store.list_users().await.unwrap().len(), 2);
        assert_eq!(store.list_films().await.unwrap().len(), 2);
        assert_eq!(store.get_film(20).await.unwrap().map(|f| f.title), Some("Heat".to_string()));
        assert_eq!(store.get_film(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_rating_requires_catalog_entries() {
        let store = InMemoryRatingStore::from_seed(seed()).await;

        let err = store.add_rating(Rating::new(1, 999, 4)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        let err = store.add_rating(Rating::new(42, 10, 4)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));

        assert_eq!(store.list_ratings().await.unwrap().len(), 2);
        assert_eq!(store.list_films().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_rating_supersedes_pair() {
        let store = InMemoryRatingStore::from_seed(seed()).await;
        store.add_rating(Rating::new(1, 10, 1)).await.unwrap();
        store.add_rating(Rating::new(1, 20, 5)).await.unwrap();

        let ratings = store.list_ratings().await.unwrap();
        assert_eq!(ratings.len(), 3);

        let watched = store.ratings_of_user(1).await.unwrap();
        assert_eq!(watched, BTreeMap::from([(10, 1), (20, 5)]));
    }

    #[tokio::test]
    async fn test_seed_json_shape() {
        let raw = r#"{
            "users": [{"id": 1, "name": "ada"}],
            "films": [{"id": 10, "title": "Alien", "year": 1979}],
            "ratings": [{"user_id": 1, "film_id": 10, "score": 5}]
        }"#;
        let seed: SeedData = serde_json::from_str(raw).unwrap();
        let store = InMemoryRatingStore::from_seed(seed).await;
        assert_eq!(store.list_ratings().await.unwrap(), vec![Rating::new(1, 10, 5)]);
    }
}
