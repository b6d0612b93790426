use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{dto::PublicUser, repo_types::User, services::AuthUser},
    skills::repo_types::UserSkill,
    state::AppState,
};

use super::dto::{RatingSummary, SearchParams, UpdateProfileRequest, UserProfile};
use super::repo;

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).patch(update_me))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(search_users))
        .route("/users/:id", get(get_user))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = repo::update_profile(
        &state.db,
        user_id,
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
        payload.city.as_deref(),
        payload.avatar_url.as_deref(),
    )
    .await
    .map_err(internal)?;

    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    let user = match User::find_by_id(&state.db, id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%id, "profile requested for unknown user");
            return Err((StatusCode::NOT_FOUND, "User not found".into()));
        }
        Err(e) => return Err(internal(e)),
    };

    let skills = UserSkill::list_detailed_for_user(&state.db, id)
        .await
        .map_err(internal)?;
    let (average, count) = repo::rating_summary(&state.db, id)
        .await
        .map_err(internal)?;

    Ok(Json(UserProfile {
        user: user.into(),
        skills,
        rating: RatingSummary { average, count },
    }))
}

#[instrument(skip(state))]
pub async fn search_users(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<PublicUser>>, (StatusCode, String)> {
    let limit = p.limit.clamp(1, 100);
    let users = repo::search(
        &state.db,
        p.q.as_deref().filter(|s| !s.trim().is_empty()),
        p.skill.as_deref().filter(|s| !s.trim().is_empty()),
        limit,
        p.offset.max(0),
    )
    .await
    .map_err(internal)?;

    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
