use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{repo_types::User, services::AuthUser},
    db,
    ratings::{
        dto::{CreateRatingRequest, RatingsResponse},
        repo::UserRating,
    },
    state::AppState,
    users,
};

pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/ratings", post(create_rating))
        .route("/users/:id/ratings", get(list_ratings))
}

#[instrument(skip(state, payload))]
pub async fn create_rating(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateRatingRequest>,
) -> Result<(StatusCode, Json<UserRating>), (StatusCode, String)> {
    if !(1..=5).contains(&payload.rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5".into(),
        ));
    }

    if payload.rated_id == user_id {
        warn!(user_id = %user_id, "self-rating rejected");
        return Err((StatusCode::BAD_REQUEST, "You cannot rate yourself".into()));
    }

    if User::find_by_id(&state.db, payload.rated_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "User not found".into()));
    }

    // Fast-path duplicate check; the (rater_id, rated_id) index has the final word
    if UserRating::exists(&state.db, user_id, payload.rated_id)
        .await
        .map_err(internal)?
    {
        return Err((
            StatusCode::CONFLICT,
            "You have already rated this user".into(),
        ));
    }

    match UserRating::create(&state.db, user_id, payload.rated_id, payload.rating).await {
        Ok(row) => {
            info!(rating_id = %row.id, rater = %user_id, rated = %payload.rated_id, "rating created");
            Ok((StatusCode::CREATED, Json(row)))
        }
        Err(e) if db::is_unique_violation(&e) => Err((
            StatusCode::CONFLICT,
            "You have already rated this user".into(),
        )),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn list_ratings(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RatingsResponse>, (StatusCode, String)> {
    let ratings = UserRating::list_received(&state.db, id)
        .await
        .map_err(internal)?;
    let (average, count) = users::repo::rating_summary(&state.db, id)
        .await
        .map_err(internal)?;

    Ok(Json(RatingsResponse {
        ratings,
        average,
        count,
    }))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
