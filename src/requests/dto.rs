use crate::requests::repo_types::RequestStatus;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateRequestRequest {
    pub receiver_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub status: RequestStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub direction: Option<Direction>,
    pub status: Option<RequestStatus>,
}
