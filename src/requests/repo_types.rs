use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle of a connection request. `pending` is initial; `accepted` and
/// `rejected` are terminal. Cancellation is modeled as a transition to
/// `rejected`, not a distinct state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Directed connection invitation between two users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Request {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: RequestStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// An accepted request seen from one side: the peer plus when the edge formed.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Connection {
    pub request_id: Uuid,
    pub peer_id: Uuid,
    pub peer_first_name: Option<String>,
    pub peer_last_name: Option<String>,
    pub peer_avatar_url: Option<String>,
    pub connected_at: OffsetDateTime,
}
