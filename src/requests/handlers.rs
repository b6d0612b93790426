use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{repo_types::User, services::AuthUser},
    db,
    requests::{
        dto::{CreateRequestRequest, Direction, ListParams, RespondRequest},
        machine::{self, CallerRole, RequestAction, TransitionError},
        repo_types::{Connection, Request},
    },
    state::AppState,
};

pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/:id", axum::routing::delete(delete_request))
        .route("/requests/:id/respond", post(respond_request))
        .route("/requests/:id/cancel", post(cancel_request))
}

pub fn connection_routes() -> Router<AppState> {
    Router::new().route("/connections", get(list_connections))
}

#[instrument(skip(state, payload))]
pub async fn create_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateRequestRequest>,
) -> Result<(StatusCode, Json<Request>), (StatusCode, String)> {
    if payload.receiver_id == user_id {
        warn!(user_id = %user_id, "self-request rejected");
        return Err((
            StatusCode::BAD_REQUEST,
            "You cannot send a request to yourself".into(),
        ));
    }

    if User::find_by_id(&state.db, payload.receiver_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "User not found".into()));
    }

    // Fast-path duplicate check; the partial unique index has the final word
    if Request::live_edge_exists(&state.db, user_id, payload.receiver_id)
        .await
        .map_err(internal)?
    {
        return Err((
            StatusCode::CONFLICT,
            "A request already exists between you and this user".into(),
        ));
    }

    match Request::create(&state.db, user_id, payload.receiver_id).await {
        Ok(req) => {
            info!(request_id = %req.id, sender = %user_id, receiver = %payload.receiver_id, "request created");
            Ok((StatusCode::CREATED, Json(req)))
        }
        Err(e) if db::is_unique_violation(&e) => Err((
            StatusCode::CONFLICT,
            "A request already exists between you and this user".into(),
        )),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state, payload))]
pub async fn respond_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondRequest>,
) -> Result<Json<Request>, (StatusCode, String)> {
    apply_transition(&state, user_id, id, RequestAction::Respond(payload.status)).await
}

#[instrument(skip(state))]
pub async fn cancel_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Request>, (StatusCode, String)> {
    apply_transition(&state, user_id, id, RequestAction::Cancel).await
}

/// Shared respond/cancel path: load, run the transition table, then a
/// compare-and-swap write so a concurrent transition cannot double-apply.
async fn apply_transition(
    state: &AppState,
    caller: Uuid,
    id: Uuid,
    action: RequestAction,
) -> Result<Json<Request>, (StatusCode, String)> {
    let req = Request::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Request not found".to_string()))?;

    let role = CallerRole::of(caller, req.sender_id, req.receiver_id);
    let next = machine::transition(req.status, role, action).map_err(|e| guard_error(&e))?;

    match Request::update_status(&state.db, id, req.status, next).await {
        Ok(Some(updated)) => {
            info!(request_id = %id, from = ?req.status, to = ?next, "request transitioned");
            Ok(Json(updated))
        }
        // Lost a race: someone else moved the record out of `pending` first
        Ok(None) => {
            let stale = match action {
                RequestAction::Respond(_) => TransitionError::RespondNotPending,
                RequestAction::Cancel => TransitionError::CancelNotPending,
            };
            Err((StatusCode::CONFLICT, stale.to_string()))
        }
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn delete_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let req = Request::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Request not found".to_string()))?;

    // Ownership check against the sender field
    if req.sender_id != user_id {
        warn!(request_id = %id, caller = %user_id, "delete denied for non-sender");
        return Err((StatusCode::FORBIDDEN, "Not permitted".into()));
    }

    match Request::delete(&state.db, id).await {
        Ok(true) => {
            info!(request_id = %id, "request deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err((StatusCode::NOT_FOUND, "Request not found".into())),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn list_requests(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<ListParams>,
) -> Result<Json<Vec<Request>>, (StatusCode, String)> {
    let rows = match p.direction {
        Some(Direction::Incoming) => Request::list_incoming(&state.db, user_id, p.status).await,
        Some(Direction::Outgoing) => Request::list_outgoing(&state.db, user_id, p.status).await,
        None => {
            // Both directions, newest first
            let mut all = Request::list_incoming(&state.db, user_id, p.status)
                .await
                .map_err(internal)?;
            all.extend(
                Request::list_outgoing(&state.db, user_id, p.status)
                    .await
                    .map_err(internal)?,
            );
            all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(all)
        }
    }
    .map_err(internal)?;

    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn list_connections(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Connection>>, (StatusCode, String)> {
    let rows = Request::list_connections(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

fn guard_error(e: &TransitionError) -> (StatusCode, String) {
    if e.is_authorization() {
        (StatusCode::FORBIDDEN, "Not permitted".into())
    } else {
        (StatusCode::CONFLICT, e.to_string())
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod guard_mapping_tests {
    use super::*;
    use crate::requests::repo_types::RequestStatus;

    #[test]
    fn authorization_guards_are_masked() {
        let (status, body) = guard_error(&TransitionError::NotReceiver);
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, "Not permitted");
    }

    #[test]
    fn state_guards_are_verbatim() {
        let (status, body) = guard_error(&TransitionError::CancelNotPending);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, "Only pending requests can be cancelled");
    }

    #[test]
    fn respond_status_deserializes_lowercase() {
        let r: RespondRequest = serde_json::from_str(r#"{"status":"accepted"}"#).unwrap();
        assert_eq!(r.status, RequestStatus::Accepted);
        assert!(serde_json::from_str::<RespondRequest>(r#"{"status":"Accepted"}"#).is_err());
    }
}
