use crate::auth::dto::PublicUser;
use crate::skills::repo_types::UserSkillDetail;
use serde::{Deserialize, Serialize};

/// Profile edit; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
}

/// Another user's profile as shown on the explore/profile pages.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: PublicUser,
    pub skills: Vec<UserSkillDetail>,
    pub rating: RatingSummary,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub skill: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}
