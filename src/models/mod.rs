use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use chrono::{DateTime, Utc};

pub type UserId = i64;
pub type FilmId = i64;
pub type Score = u8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    pub id: FilmId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// One observed (user, film, score) triple. The (user, film) pair is the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub film_id: FilmId,
    pub score: Score,
}

/// Inclusive bounds of the rating scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: Score,
    pub max: Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub film_id: FilmId,
    pub predicted_score: f64,
    /// 1-based position; implicit in list order on the wire.
    #[serde(skip_serializing, default)]
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub recommendations: Vec<Recommendation>,
    pub snapshot_version: Uuid,
    pub generated_at: DateTime<Utc>,
}

/// Watched list of one user, film id to score.
pub type WatchedList = BTreeMap<FilmId, Score>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub films: Vec<Film>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

impl Film {
    pub fn new(id: FilmId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            year: None,
            genre: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }
}

impl Rating {
    pub fn new(user_id: UserId, film_id: FilmId, score: Score) -> Self {
        Self { user_id, film_id, score }
    }
}

impl RatingScale {
    pub fn new(min: Score, max: Score) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, score: Score) -> bool {
        (self.min..=self.max).contains(&score)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min as f64, self.max as f64)
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}
