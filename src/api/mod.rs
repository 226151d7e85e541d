use crate::error::RecommendError;
use crate::models::*;
use crate::utils::validation::{require_user_id, resolve_count};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Response envelope: either a typed payload or an error message.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse<T> {
    Success { data: T },
    Error { message: String },
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse::Success { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ApiResponse::Error {
            message: message.into(),
        }
    }
}

impl IntoResponse for RecommendError {
    fn into_response(self) -> Response {
        let status = match &self {
            RecommendError::UnknownUser(_) | RecommendError::NotFound(_) => StatusCode::NOT_FOUND,
            RecommendError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RecommendError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RecommendError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, self);
        } else {
            tracing::warn!("Request rejected with {}: {}", status, self);
        }

        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, RecommendError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub snapshot_version: Option<Uuid>,
    pub stats: HashMap<String, u64>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user: Option<String>,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UsersPayload {
    One(User),
    All(Vec<User>),
}

#[derive(Debug, Deserialize)]
pub struct WatchedQuery {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchedPayload {
    One(WatchedList),
    All(BTreeMap<UserId, WatchedList>),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WatchedRequest {
    pub user_id: UserId,
    pub film_id: FilmId,
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub user_id: Option<UserId>,
    pub num_results: Option<i64>,
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let service = &state.recommendation_service;
    Json(ApiResponse::success(HealthStatus {
        status: "healthy".to_string(),
        service: "filmrec".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        snapshot_version: service.current_snapshot().map(|s| s.version),
        stats: service.get_serving_stats(),
    }))
}

async fn get_users(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> ApiResult<UsersPayload> {
    let store = state.recommendation_service.store();

    let payload = match (params.user, params.user_id) {
        (Some(name), _) => {
            let user = store.get_user_by_name(&name).await?;
            UsersPayload::One(user.ok_or_else(|| {
                RecommendError::NotFound(format!("no user named {}", name))
            })?)
        }
        (None, Some(user_id)) => {
            let user = store.get_user(user_id).await?;
            UsersPayload::One(user.ok_or(RecommendError::UnknownUser(user_id))?)
        }
        (None, None) => UsersPayload::All(store.list_users().await?),
    };

    Ok(Json(ApiResponse::success(payload)))
}

async fn get_watched(
    State(state): State<AppState>,
    Query(params): Query<WatchedQuery>,
) -> ApiResult<WatchedPayload> {
    let store = state.recommendation_service.store();

    let payload = match params.user_id {
        Some(user_id) => WatchedPayload::One(store.ratings_of_user(user_id).await?),
        None => {
            let mut lists: BTreeMap<UserId, WatchedList> = BTreeMap::new();
            for rating in store.list_ratings().await? {
                lists
                    .entry(rating.user_id)
                    .or_default()
                    .insert(rating.film_id, rating.score);
            }
            WatchedPayload::All(lists)
        }
    };

    Ok(Json(ApiResponse::success(payload)))
}

async fn add_watched(
    State(state): State<AppState>,
    Json(request): Json<WatchedRequest>,
) -> ApiResult<String> {
    state
        .recommendation_service
        .add_rating(request.user_id, request.film_id, request.rating)
        .await?;

    Ok(Json(ApiResponse::success("film successfully added".to_string())))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendQuery>,
) -> ApiResult<Vec<Recommendation>> {
    let user_id = require_user_id(params.user_id)?;
    let limits = &state.config.recommendation;
    let count = resolve_count(params.num_results, limits.default_count, limits.max_count);

    let response = state.recommendation_service.recommend(user_id, count).await?;
    Ok(Json(ApiResponse::success(response.recommendations)))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", get(get_users))
        .route("/watched", get(get_watched).post(add_watched))
        .route("/recommend", get(get_recommendations))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
