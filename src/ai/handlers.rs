use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    ai::{
        dto::{ExtractSkillsRequest, ExtractedSkill, RecommendationsResponse},
        services,
    },
    auth::services::AuthUser,
    skills::repo_types::UserSkill,
    state::AppState,
};

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/ai/extract-skills", post(extract_skills))
        .route("/ai/recommendations", get(recommendations))
}

#[instrument(skip(state, payload))]
pub async fn extract_skills(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<ExtractSkillsRequest>,
) -> Result<Json<Vec<ExtractedSkill>>, (StatusCode, String)> {
    if payload.content.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Content is required for skill extraction".into(),
        ));
    }

    match services::extract_skills(state.ai.as_ref(), &payload.content).await {
        Ok(skills) => Ok(Json(skills)),
        Err(e) => {
            error!(error = %e, "skill extraction failed");
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

#[instrument(skip(state))]
pub async fn recommendations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<RecommendationsResponse>, (StatusCode, String)> {
    let skills = UserSkill::list_detailed_for_user(&state.db, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "loading user skills failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    // Never fails: retry then static fallback inside
    let response = services::recommend_skills(state.ai.as_ref(), &state.config.ai, &skills).await;
    Ok(Json(response))
}
