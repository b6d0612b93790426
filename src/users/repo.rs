use crate::auth::repo::USER_COLUMNS;
use crate::auth::repo_types::User;
use sqlx::PgPool;
use uuid::Uuid;

/// Partial profile update; NULL binds leave the column as-is.
pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    first_name: Option<&str>,
    last_name: Option<&str>,
    city: Option<&str>,
    avatar_url: Option<&str>,
) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET \
             first_name = COALESCE($2, first_name), \
             last_name = COALESCE($3, last_name), \
             city = COALESCE($4, city), \
             avatar_url = COALESCE($5, avatar_url) \
         WHERE id = $1 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(first_name)
    .bind(last_name)
    .bind(city)
    .bind(avatar_url)
    .fetch_one(db)
    .await?;
    Ok(user)
}

/// Discovery query: optional name/email prefix and optional skill-name filter.
pub async fn search(
    db: &PgPool,
    q: Option<&str>,
    skill: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<User>> {
    let name_pattern = q.map(|q| format!("{}%", q));
    let skill_pattern = skill.map(str::to_string);

    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users u \
         WHERE ($1::text IS NULL \
                OR u.first_name ILIKE $1 \
                OR u.last_name ILIKE $1 \
                OR u.email ILIKE $1) \
           AND ($2::text IS NULL OR EXISTS ( \
                SELECT 1 FROM user_skills us \
                JOIN skills s ON s.id = us.skill_id \
                WHERE us.user_id = u.id AND s.name ILIKE $2)) \
         ORDER BY u.created_at DESC \
         LIMIT $3 OFFSET $4"
    ))
    .bind(name_pattern)
    .bind(skill_pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(users)
}

/// Average received rating and number of ratings.
pub async fn rating_summary(db: &PgPool, user_id: Uuid) -> anyhow::Result<(Option<f64>, i64)> {
    let row = sqlx::query_as::<_, (Option<f64>, i64)>(
        "SELECT AVG(rating)::float8, COUNT(*) FROM user_ratings WHERE rated_id = $1",
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(row)
}
