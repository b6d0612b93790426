use crate::ratings::repo::UserRating;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    pub rated_id: Uuid,
    pub rating: i32,
}

#[derive(Debug, Serialize)]
pub struct RatingsResponse {
    pub ratings: Vec<UserRating>,
    pub average: Option<f64>,
    pub count: i64,
}
