use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: OffsetDateTime,
}

impl Message {
    pub async fn create(
        db: &PgPool,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> anyhow::Result<Message> {
        let row = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (sender_id, receiver_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, sender_id, receiver_id, content, read, created_at
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Message>> {
        let row = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, sender_id, receiver_id, content, read, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Both directions of a conversation, ascending. `since` trims to newer
    /// messages so the polling client only pulls the delta.
    pub async fn conversation(
        db: &PgPool,
        user_id: Uuid,
        peer_id: Uuid,
        since: Option<OffsetDateTime>,
    ) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, sender_id, receiver_id, content, read, created_at
            FROM messages
            WHERE ((sender_id = $1 AND receiver_id = $2)
                OR (sender_id = $2 AND receiver_id = $1))
              AND ($3::timestamptz IS NULL OR created_at > $3)
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(peer_id)
        .bind(since)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn set_read(db: &PgPool, id: Uuid, read: bool) -> anyhow::Result<Message> {
        let row = sqlx::query_as::<_, Message>(
            r#"
            UPDATE messages SET read = $2
            WHERE id = $1
            RETURNING id, sender_id, receiver_id, content, read, created_at
            "#,
        )
        .bind(id)
        .bind(read)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}
