use crate::skills::repo_types::ProficiencyLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ExtractSkillsRequest {
    pub content: String,
}

/// A skill pulled out of free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedSkill {
    pub name: String,
    pub description: String,
    pub proficiency_level: ProficiencyLevel,
}

/// One suggested next skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub name: String,
    pub description: String,
    pub reason: String,
}

/// Where a recommendation list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    /// The user has no skills yet; the backend was never called.
    Empty,
    /// Live model output.
    Model,
    /// Static fallback after the retry budget ran out.
    Default,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
    pub source: RecommendationSource,
}
