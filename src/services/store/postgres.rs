use super::{RatingStore, StoreResult};
use crate::config::PostgresConfig;
use crate::error::StoreError;
use crate::models::*;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS users (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS films (
        id BIGINT PRIMARY KEY,
        title TEXT NOT NULL,
        year INTEGER,
        genre TEXT
    )",
    "CREATE TABLE IF NOT EXISTS watched (
        user_id BIGINT NOT NULL REFERENCES users (id),
        film_id BIGINT NOT NULL REFERENCES films (id),
        rating SMALLINT NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (user_id, film_id)
    )",
];

/// Rating store over the `users`, `films` and `watched` tables.
pub struct PgRatingStore {
    pool: PgPool,
}

impl PgRatingStore {
    pub async fn connect(config: &PostgresConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!("Connected to postgres rating store (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn to_score(raw: i16) -> StoreResult<Score> {
    Score::try_from(raw).map_err(|_| StoreError::InvalidData(format!("rating {} out of range", raw)))
}

fn to_rating((user_id, film_id, score): (i64, i64, i16)) -> StoreResult<Rating> {
    Ok(Rating::new(user_id, film_id, to_score(score)?))
}

fn to_film((id, title, year, genre): (i64, String, Option<i32>, Option<String>)) -> Film {
    Film { id, title, year, genre }
}

#[async_trait::async_trait]
impl RatingStore for PgRatingStore {
    async fn list_ratings(&self) -> StoreResult<Vec<Rating>> {
        let rows: Vec<(i64, i64, i16)> = sqlx::query_as(
            "SELECT user_id, film_id, rating FROM watched ORDER BY updated_at, user_id, film_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(to_rating).collect()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id, name)| User { id, name }).collect())
    }

    async fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let row: Option<(i64, String)> = sqlx::query_as("SELECT id, name FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, name)| User { id, name }))
    }

    async fn get_user_by_name(&self, name: &str) -> StoreResult<Option<User>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM users WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, name)| User { id, name }))
    }

    async fn list_films(&self) -> StoreResult<Vec<Film>> {
        let rows: Vec<(i64, String, Option<i32>, Option<String>)> =
            sqlx::query_as("SELECT id, title, year, genre FROM films ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(to_film).collect())
    }

    async fn get_film(&self, film_id: FilmId) -> StoreResult<Option<Film>> {
        let row: Option<(i64, String, Option<i32>, Option<String>)> =
            sqlx::query_as("SELECT id, title, year, genre FROM films WHERE id = $1")
                .bind(film_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(to_film))
    }

    async fn ratings_of_user(&self, user_id: UserId) -> StoreResult<WatchedList> {
        let rows: Vec<(i64, i16)> =
            sqlx::query_as("SELECT film_id, rating FROM watched WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(film_id, score)| Ok((film_id, to_score(score)?)))
            .collect()
    }

    async fn add_rating(&self, rating: Rating) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO watched (user_id, film_id, rating) VALUES ($1, $2, $3)
             ON CONFLICT (user_id, film_id)
             DO UPDATE SET rating = EXCLUDED.rating, updated_at = now()",
        )
        .bind(rating.user_id)
        .bind(rating.film_id)
        .bind(rating.score as i16)
        .execute(&self.pool)
        .await?;

        info!(
            "Stored rating {} for user {} film {}",
            rating.score, rating.user_id, rating.film_id
        );
        Ok(())
    }
}
