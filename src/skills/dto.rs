use crate::skills::repo_types::ProficiencyLevel;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttachSkillRequest {
    pub skill_id: Uuid,
    pub proficiency_level: ProficiencyLevel,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserSkillRequest {
    pub proficiency_level: ProficiencyLevel,
}
