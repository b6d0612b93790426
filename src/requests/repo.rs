use crate::requests::repo_types::{Connection, Request, RequestStatus};
use sqlx::PgPool;
use uuid::Uuid;

const REQUEST_COLUMNS: &str = "id, sender_id, receiver_id, status, created_at, updated_at";

impl Request {
    pub async fn create(db: &PgPool, sender_id: Uuid, receiver_id: Uuid) -> anyhow::Result<Request> {
        let row = sqlx::query_as::<_, Request>(&format!(
            "INSERT INTO requests (sender_id, receiver_id) \
             VALUES ($1, $2) \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Request>> {
        let row = sqlx::query_as::<_, Request>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// A pending or accepted request already connects the pair, in either
    /// direction. Fast path only; `requests_live_pair_idx` is authoritative.
    pub async fn live_edge_exists(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                SELECT 1 FROM requests \
                WHERE status <> 'rejected' \
                  AND ((sender_id = $1 AND receiver_id = $2) \
                    OR (sender_id = $2 AND receiver_id = $1)))",
        )
        .bind(a)
        .bind(b)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    /// Compare-and-swap status write: only succeeds while the record is still
    /// in `expected`, so a concurrent transition loses cleanly.
    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> anyhow::Result<Option<Request>> {
        let row = sqlx::query_as::<_, Request>(&format!(
            "UPDATE requests SET status = $3, updated_at = now() \
             WHERE id = $1 AND status = $2 \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(id)
        .bind(expected)
        .bind(next)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn list_incoming(
        db: &PgPool,
        user_id: Uuid,
        status: Option<RequestStatus>,
    ) -> anyhow::Result<Vec<Request>> {
        let rows = sqlx::query_as::<_, Request>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests \
             WHERE receiver_id = $1 AND ($2::request_status IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(status)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_outgoing(
        db: &PgPool,
        user_id: Uuid,
        status: Option<RequestStatus>,
    ) -> anyhow::Result<Vec<Request>> {
        let rows = sqlx::query_as::<_, Request>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests \
             WHERE sender_id = $1 AND ($2::request_status IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(status)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Peers on the other end of an accepted request involving `user_id`.
    pub async fn list_connections(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Connection>> {
        let rows = sqlx::query_as::<_, Connection>(
            r#"
            SELECT r.id AS request_id,
                   u.id AS peer_id,
                   u.first_name AS peer_first_name,
                   u.last_name AS peer_last_name,
                   u.avatar_url AS peer_avatar_url,
                   r.updated_at AS connected_at
            FROM requests r
            JOIN users u
              ON u.id = CASE WHEN r.sender_id = $1 THEN r.receiver_id ELSE r.sender_id END
            WHERE r.status = 'accepted'
              AND (r.sender_id = $1 OR r.receiver_id = $1)
            ORDER BY r.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// True when an accepted request connects the pair, in either direction.
    pub async fn are_connected(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                SELECT 1 FROM requests \
                WHERE status = 'accepted' \
                  AND ((sender_id = $1 AND receiver_id = $2) \
                    OR (sender_id = $2 AND receiver_id = $1)))",
        )
        .bind(a)
        .bind(b)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }
}
