use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::services::AuthUser,
    db,
    skills::{
        dto::{AttachSkillRequest, CreateSkillRequest, UpdateUserSkillRequest},
        repo_types::{Skill, UserSkill, UserSkillDetail},
    },
    state::AppState,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/skills", get(list_skills).post(create_skill))
        .route("/skills/:id", delete(delete_skill))
}

pub fn user_skill_routes() -> Router<AppState> {
    Router::new()
        .route("/me/skills", post(attach_skill))
        .route(
            "/me/skills/:skill_id",
            delete(detach_skill).patch(update_skill_level),
        )
        .route("/users/:id/skills", get(list_user_skills))
}

#[instrument(skip(state))]
pub async fn list_skills(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<Vec<Skill>>, (StatusCode, String)> {
    let skills = Skill::list(&state.db).await.map_err(internal)?;
    Ok(Json(skills))
}

#[instrument(skip(state, payload))]
pub async fn create_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateSkillRequest>,
) -> Result<(StatusCode, Json<Skill>), (StatusCode, String)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Skill name is required".into()));
    }

    match Skill::create(&state.db, name, payload.description.as_deref()).await {
        Ok(skill) => {
            info!(skill_id = %skill.id, name = %skill.name, created_by = %user_id, "skill created");
            Ok((StatusCode::CREATED, Json(skill)))
        }
        Err(e) if db::is_unique_violation(&e) => {
            warn!(name = %name, "duplicate skill name");
            Err((
                StatusCode::CONFLICT,
                format!("A skill named \"{}\" already exists", name),
            ))
        }
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn delete_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let skill = Skill::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Skill not found".to_string()))?;

    // Referential guard; ON DELETE RESTRICT backs this up under races
    if Skill::is_referenced(&state.db, id).await.map_err(internal)? {
        warn!(skill_id = %id, "attempted to delete referenced skill");
        return Err((
            StatusCode::CONFLICT,
            format!(
                "Cannot delete skill \"{}\" because it is being used by one or more users. \
                 Remove all user skills associated with this skill before deleting it.",
                skill.name
            ),
        ));
    }

    match Skill::delete(&state.db, id).await {
        Ok(true) => {
            info!(skill_id = %id, deleted_by = %user_id, "skill deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err((StatusCode::NOT_FOUND, "Skill not found".into())),
        Err(e) if db::is_foreign_key_violation(&e) => Err((
            StatusCode::CONFLICT,
            format!(
                "Cannot delete skill \"{}\" because it is being used by one or more users. \
                 Remove all user skills associated with this skill before deleting it.",
                skill.name
            ),
        )),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state, payload))]
pub async fn attach_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AttachSkillRequest>,
) -> Result<(StatusCode, Json<UserSkill>), (StatusCode, String)> {
    if Skill::find_by_id(&state.db, payload.skill_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "Skill not found".into()));
    }

    // Fast-path duplicate check; the (user_id, skill_id) index has the final word
    if UserSkill::exists(&state.db, user_id, payload.skill_id)
        .await
        .map_err(internal)?
    {
        return Err((
            StatusCode::CONFLICT,
            "You already have this skill in your profile.".into(),
        ));
    }

    match UserSkill::attach(&state.db, user_id, payload.skill_id, payload.proficiency_level).await {
        Ok(row) => {
            info!(user_id = %user_id, skill_id = %payload.skill_id, "skill attached");
            Ok((StatusCode::CREATED, Json(row)))
        }
        Err(e) if db::is_unique_violation(&e) => Err((
            StatusCode::CONFLICT,
            "You already have this skill in your profile.".into(),
        )),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state, payload))]
pub async fn update_skill_level(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(skill_id): Path<Uuid>,
    Json(payload): Json<UpdateUserSkillRequest>,
) -> Result<Json<UserSkill>, (StatusCode, String)> {
    match UserSkill::update_level(&state.db, user_id, skill_id, payload.proficiency_level).await {
        Ok(Some(row)) => Ok(Json(row)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            "Skill is not in your profile".into(),
        )),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn detach_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(skill_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    match UserSkill::detach(&state.db, user_id, skill_id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            "Skill is not in your profile".into(),
        )),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn list_user_skills(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<UserSkillDetail>>, (StatusCode, String)> {
    let rows = UserSkill::list_detailed_for_user(&state.db, id)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
