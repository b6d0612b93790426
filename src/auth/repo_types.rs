use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // Argon2 hash; NULL for OAuth-only accounts
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub avatar_url: Option<String>,
    pub google_profile_id: Option<String>,
    pub google_image_url: Option<String>,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,
    pub email_verification_expires: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<OffsetDateTime>,
    pub roles: Vec<String>,
    pub last_signed_in: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}
