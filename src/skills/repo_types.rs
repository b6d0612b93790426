use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// How well a user knows a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "proficiency_level")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl ProficiencyLevel {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Beginner" => Some(Self::Beginner),
            "Intermediate" => Some(Self::Intermediate),
            "Expert" => Some(Self::Expert),
            _ => None,
        }
    }
}

/// Catalog entry; name is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Join row between a user and a skill.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSkill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub skill_id: Uuid,
    pub proficiency_level: ProficiencyLevel,
    pub created_at: OffsetDateTime,
}

/// A user's skill joined with its catalog entry.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSkillDetail {
    pub skill_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub proficiency_level: ProficiencyLevel,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod proficiency_tests {
    use super::ProficiencyLevel;

    #[test]
    fn from_label_accepts_exact_levels_only() {
        assert_eq!(
            ProficiencyLevel::from_label("Beginner"),
            Some(ProficiencyLevel::Beginner)
        );
        assert_eq!(
            ProficiencyLevel::from_label("Expert"),
            Some(ProficiencyLevel::Expert)
        );
        assert_eq!(ProficiencyLevel::from_label("expert"), None);
        assert_eq!(ProficiencyLevel::from_label("Guru"), None);
        assert_eq!(ProficiencyLevel::from_label(""), None);
    }

    #[test]
    fn serializes_as_plain_label() {
        let json = serde_json::to_string(&ProficiencyLevel::Intermediate).unwrap();
        assert_eq!(json, "\"Intermediate\"");
    }
}
