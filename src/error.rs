use crate::models::UserId;

/// Failures of the rating store boundary.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Rating store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Seed file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Seed data error: {0}")]
    Seed(#[from] serde_json::Error),
}

/// Errors surfaced by the recommender facade.
///
/// Missing evidence is not an error: similarity and prediction return `None`
/// and the ranker filters those candidates out.
#[derive(thiserror::Error, Debug)]
pub enum RecommendError {
    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rating data unavailable: {0}")]
    DataUnavailable(#[source] StoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for RecommendError {
    fn from(err: StoreError) -> Self {
        RecommendError::DataUnavailable(err)
    }
}

pub type RecommendResult<T> = Result<T, RecommendError>;
