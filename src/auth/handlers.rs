use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
            RefreshRequest, RegisterRequest, ResetPasswordRequest,
        },
        repo_types::User,
        services::{
            generate_one_time_token, hash_password, is_valid_email, verify_password, AuthUser,
            JwtKeys,
        },
    },
    db,
    state::AppState,
};

const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;
const RESET_TOKEN_TTL_MINUTES: i64 = 30;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/change-password", post(change_password))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

fn token_pair(
    keys: &JwtKeys,
    user_id: uuid::Uuid,
) -> Result<(String, String), (StatusCode, String)> {
    let access = keys.sign_access(user_id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let refresh = keys.sign_refresh(user_id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok((access, refresh))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    // Fast-path duplicate check; the unique index has the final word
    if let Ok(Some(_)) = User::find_by_email(&state.db, &payload.email).await {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::CONFLICT, "Email already registered".into()));
    }

    let hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let verification_token = generate_one_time_token();
    let verification_expires =
        OffsetDateTime::now_utc() + TimeDuration::hours(VERIFICATION_TOKEN_TTL_HOURS);

    let user = match User::create(
        &state.db,
        &payload.email,
        &hash,
        &verification_token,
        verification_expires,
    )
    .await
    {
        Ok(u) => u,
        Err(e) if db::is_unique_violation(&e) => {
            warn!(email = %payload.email, "email already registered (lost race)");
            return Err((StatusCode::CONFLICT, "Email already registered".into()));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    // No mailer wired up; the verification link lands in the logs
    info!(user_id = %user.id, token = %verification_token, "verification token issued");

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = token_pair(&keys, user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let Some(stored_hash) = user.password_hash.as_deref() else {
        // OAuth-only account, no password to check
        warn!(user_id = %user.id, "login attempt against passwordless account");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    };

    let ok = match verify_password(&payload.password, stored_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    if let Err(e) = User::touch_last_signed_in(&state.db, user.id).await {
        warn!(error = %e, user_id = %user.id, "failed to update last_signed_in");
    }

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = token_pair(&keys, user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, format!("{}", e)))?;

    let (access_token, refresh_token) = token_pair(&keys, claims.sub)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .ok()
        .flatten()
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if payload.new_password.len() < 8 {
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let Some(stored_hash) = user.password_hash.as_deref() else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Account has no password set".into(),
        ));
    };

    if !verify_password(&payload.current_password, stored_hash).map_err(internal)? {
        warn!(user_id = %user_id, "change-password with wrong current password");
        return Err((StatusCode::FORBIDDEN, "Not permitted".into()));
    }

    let hash = hash_password(&payload.new_password).map_err(internal)?;
    User::update_password(&state.db, user_id, &hash)
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    // Same response whether or not the account exists
    if is_valid_email(&payload.email) {
        let token = generate_one_time_token();
        let expires = OffsetDateTime::now_utc() + TimeDuration::minutes(RESET_TOKEN_TTL_MINUTES);
        match User::set_reset_token(&state.db, &payload.email, &token, expires).await {
            Ok(true) => {
                info!(email = %payload.email, token = %token, "password reset token issued")
            }
            Ok(false) => warn!(email = %payload.email, "reset requested for unknown email"),
            Err(e) => error!(error = %e, "set_reset_token failed"),
        }
    }

    Ok(StatusCode::ACCEPTED)
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if payload.new_password.len() < 8 {
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    let user = User::find_by_live_reset_token(&state.db, &payload.token)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::BAD_REQUEST,
            "Invalid or expired reset token".to_string(),
        ))?;

    let hash = hash_password(&payload.new_password).map_err(internal)?;
    User::consume_reset_token(&state.db, user.id, &hash)
        .await
        .map_err(internal)?;

    info!(user_id = %user.id, "password reset completed");
    Ok(StatusCode::NO_CONTENT)
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod dto_tests {
    use crate::auth::dto::PublicUser;
    use time::OffsetDateTime;

    #[test]
    fn public_user_serializes_profile_fields() {
        let user = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            first_name: Some("Ada".into()),
            last_name: None,
            city: Some("London".into()),
            avatar_url: None,
            email_verified: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("Ada"));
        assert!(json.contains("London"));
        assert!(!json.contains("password"));
    }
}
