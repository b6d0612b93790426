use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRating {
    pub id: Uuid,
    pub rater_id: Uuid,
    pub rated_id: Uuid,
    pub rating: i32,
    pub created_at: OffsetDateTime,
}

impl UserRating {
    pub async fn create(
        db: &PgPool,
        rater_id: Uuid,
        rated_id: Uuid,
        rating: i32,
    ) -> anyhow::Result<UserRating> {
        let row = sqlx::query_as::<_, UserRating>(
            r#"
            INSERT INTO user_ratings (rater_id, rated_id, rating)
            VALUES ($1, $2, $3)
            RETURNING id, rater_id, rated_id, rating, created_at
            "#,
        )
        .bind(rater_id)
        .bind(rated_id)
        .bind(rating)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn exists(db: &PgPool, rater_id: Uuid, rated_id: Uuid) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM user_ratings WHERE rater_id = $1 AND rated_id = $2)",
        )
        .bind(rater_id)
        .bind(rated_id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn list_received(db: &PgPool, rated_id: Uuid) -> anyhow::Result<Vec<UserRating>> {
        let rows = sqlx::query_as::<_, UserRating>(
            r#"
            SELECT id, rater_id, rated_id, rating, created_at
            FROM user_ratings
            WHERE rated_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(rated_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
