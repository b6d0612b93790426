use crate::skills::repo_types::{ProficiencyLevel, Skill, UserSkill, UserSkillDetail};
use sqlx::PgPool;
use uuid::Uuid;

impl Skill {
    pub async fn create(db: &PgPool, name: &str, description: Option<&str>) -> anyhow::Result<Skill> {
        let skill = sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(db)
        .await?;
        Ok(skill)
    }

    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Skill>> {
        let rows = sqlx::query_as::<_, Skill>(
            r#"
            SELECT id, name, description, created_at
            FROM skills
            ORDER BY name ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Skill>> {
        let skill = sqlx::query_as::<_, Skill>(
            r#"
            SELECT id, name, description, created_at
            FROM skills
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(skill)
    }

    /// True while at least one user still lists the skill.
    pub async fn is_referenced(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM user_skills WHERE skill_id = $1)",
        )
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM skills WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

impl UserSkill {
    pub async fn exists(db: &PgPool, user_id: Uuid, skill_id: Uuid) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM user_skills WHERE user_id = $1 AND skill_id = $2)",
        )
        .bind(user_id)
        .bind(skill_id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn attach(
        db: &PgPool,
        user_id: Uuid,
        skill_id: Uuid,
        level: ProficiencyLevel,
    ) -> anyhow::Result<UserSkill> {
        let row = sqlx::query_as::<_, UserSkill>(
            r#"
            INSERT INTO user_skills (user_id, skill_id, proficiency_level)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, skill_id, proficiency_level, created_at
            "#,
        )
        .bind(user_id)
        .bind(skill_id)
        .bind(level)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update_level(
        db: &PgPool,
        user_id: Uuid,
        skill_id: Uuid,
        level: ProficiencyLevel,
    ) -> anyhow::Result<Option<UserSkill>> {
        let row = sqlx::query_as::<_, UserSkill>(
            r#"
            UPDATE user_skills SET proficiency_level = $3
            WHERE user_id = $1 AND skill_id = $2
            RETURNING id, user_id, skill_id, proficiency_level, created_at
            "#,
        )
        .bind(user_id)
        .bind(skill_id)
        .bind(level)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn detach(db: &PgPool, user_id: Uuid, skill_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM user_skills WHERE user_id = $1 AND skill_id = $2")
            .bind(user_id)
            .bind(skill_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn list_detailed_for_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<UserSkillDetail>> {
        let rows = sqlx::query_as::<_, UserSkillDetail>(
            r#"
            SELECT us.skill_id, s.name, s.description, us.proficiency_level, us.created_at
            FROM user_skills us
            JOIN skills s ON s.id = us.skill_id
            WHERE us.user_id = $1
            ORDER BY s.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
