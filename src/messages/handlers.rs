use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::services::AuthUser,
    messages::{
        dto::{ConversationParams, SendMessageRequest, UpdateMessageRequest},
        repo::Message,
    },
    requests::repo_types::Request,
    state::AppState,
};

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/:id", axum::routing::patch(update_message))
        .route("/messages/with/:peer_id", get(conversation))
}

#[instrument(skip(state, payload))]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), (StatusCode, String)> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message content is required".into()));
    }
    if payload.receiver_id == user_id {
        return Err((
            StatusCode::BAD_REQUEST,
            "You cannot message yourself".into(),
        ));
    }

    // Messaging is gated on an accepted connection
    if !Request::are_connected(&state.db, user_id, payload.receiver_id)
        .await
        .map_err(internal)?
    {
        warn!(sender = %user_id, receiver = %payload.receiver_id, "message to non-connection");
        return Err((
            StatusCode::FORBIDDEN,
            "You can only message your connections".into(),
        ));
    }

    let msg = Message::create(&state.db, user_id, payload.receiver_id, content)
        .await
        .map_err(internal)?;

    info!(message_id = %msg.id, sender = %user_id, receiver = %payload.receiver_id, "message sent");
    Ok((StatusCode::CREATED, Json(msg)))
}

#[instrument(skip(state))]
pub async fn conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(peer_id): Path<Uuid>,
    Query(p): Query<ConversationParams>,
) -> Result<Json<Vec<Message>>, (StatusCode, String)> {
    let rows = Message::conversation(&state.db, user_id, peer_id, p.since)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

#[instrument(skip(state, payload))]
pub async fn update_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMessageRequest>,
) -> Result<Json<Message>, (StatusCode, String)> {
    let msg = Message::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Message not found".to_string()))?;

    // Only the receiver may flip the read flag
    if msg.receiver_id != user_id {
        warn!(message_id = %id, caller = %user_id, "read-flag update denied");
        return Err((StatusCode::FORBIDDEN, "Not permitted".into()));
    }

    let updated = Message::set_read(&state.db, id, payload.read)
        .await
        .map_err(internal)?;
    Ok(Json(updated))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
