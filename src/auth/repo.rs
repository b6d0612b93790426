use crate::auth::repo_types::User;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, city, \
     avatar_url, google_profile_id, google_image_url, email_verified, \
     email_verification_token, email_verification_expires, \
     reset_password_token, reset_password_expires, roles, last_signed_in, created_at";

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password and a pending verification token.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        verification_token: &str,
        verification_expires: OffsetDateTime,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
                 (email, password_hash, email_verification_token, \
                  email_verification_expires, last_signed_in) \
             VALUES ($1, $2, $3, $4, now()) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .bind(verification_token)
        .bind(verification_expires)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn touch_last_signed_in(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_signed_in = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Store a password-reset token. Returns false when the email is unknown.
    pub async fn set_reset_token(
        db: &PgPool,
        email: &str,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "UPDATE users SET reset_password_token = $2, reset_password_expires = $3 \
             WHERE email = $1",
        )
        .bind(email)
        .bind(token)
        .bind(expires)
        .execute(db)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Find the holder of a reset token that has not yet expired.
    pub async fn find_by_live_reset_token(db: &PgPool, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE reset_password_token = $1 AND reset_password_expires > now()"
        ))
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Store the new hash and clear the consumed reset token in one write.
    pub async fn consume_reset_token(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, \
                 reset_password_token = NULL, reset_password_expires = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }
}
