use crate::ai::client::GenerativeClient;
use crate::ai::dto::{ExtractedSkill, Recommendation, RecommendationSource, RecommendationsResponse};
use crate::ai::parse;
use crate::config::AiConfig;
use crate::skills::repo_types::{ProficiencyLevel, UserSkillDetail};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const MAX_RECOMMENDATIONS: usize = 5;

/// Extraction is a primary feature: failures surface to the caller instead
/// of degrading into a guess.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("generative call failed: {0}")]
    Backend(#[source] anyhow::Error),
    #[error("Unable to extract skills from the provided content")]
    Unparseable,
    #[error("A skill without a name was returned")]
    MissingName,
}

fn extraction_prompt(content: &str) -> String {
    format!(
        "Analyze the following text and extract a list of technical skills mentioned.\n\
         For each skill:\n\
         1. Provide the skill name\n\
         2. Write a brief description of the skill\n\
         3. Estimate the proficiency level as either \"Beginner\", \"Intermediate\", or \"Expert\" based on context clues\n\
         \n\
         Format your response as a JSON array of objects with \"name\", \"description\", and \"proficiencyLevel\" fields.\n\
         Only include technical skills, not soft skills or personal traits. The proficiency level must be exactly one of: \"Beginner\", \"Intermediate\", or \"Expert\".\n\
         \n\
         Text to analyze:\n{content}"
    )
}

fn recommendation_prompt(skills: &[UserSkillDetail]) -> String {
    let current: Vec<Value> = skills
        .iter()
        .map(|s| {
            json!({
                "name": s.name,
                "description": s.description.clone().unwrap_or_default(),
                "proficiency": s.proficiency_level,
            })
        })
        .collect();

    format!(
        "Based on the following skills a user has, suggest 5 new skills they should learn next.\n\
         \n\
         User's current skills:\n{}\n\
         \n\
         Provide a JSON array of objects with the following structure:\n\
         [{{\"name\": \"Skill Name\", \"description\": \"Brief description of the skill\", \"reason\": \"Why this skill complements their existing skillset\"}}]\n\
         \n\
         Return ONLY the JSON array, with no additional text.",
        serde_json::to_string_pretty(&current).unwrap_or_else(|_| "[]".into())
    )
}

fn string_field(entry: &Value, key: &str) -> Option<String> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Derive a structured skill list from free text. Strict contract: an
/// unparseable response or a nameless entry fails the whole call.
pub async fn extract_skills(
    client: &dyn GenerativeClient,
    content: &str,
) -> Result<Vec<ExtractedSkill>, ExtractError> {
    let text = client
        .generate(&extraction_prompt(content))
        .await
        .map_err(ExtractError::Backend)?;

    let entries = parse::extract_json_array(&text).map_err(|e| {
        warn!(error = %e, "extraction response had no parseable JSON");
        ExtractError::Unparseable
    })?;

    let mut skills = Vec::with_capacity(entries.len());
    for entry in &entries {
        let name = string_field(entry, "name").ok_or(ExtractError::MissingName)?;
        let description = string_field(entry, "description").unwrap_or_default();
        // Out-of-enum levels coerce to the middle of the scale
        let proficiency_level = entry
            .get("proficiencyLevel")
            .and_then(Value::as_str)
            .and_then(ProficiencyLevel::from_label)
            .unwrap_or(ProficiencyLevel::Intermediate);
        skills.push(ExtractedSkill {
            name,
            description,
            proficiency_level,
        });
    }

    info!(count = skills.len(), "skills extracted");
    Ok(skills)
}

fn parse_recommendations(text: &str) -> anyhow::Result<Vec<Recommendation>> {
    let entries = parse::extract_json_array(text)?;

    // Malformed entries are dropped, not fatal
    let valid: Vec<Recommendation> = entries
        .iter()
        .filter_map(|entry| {
            let name = string_field(entry, "name")?;
            let description = string_field(entry, "description").unwrap_or_default();
            let reason = string_field(entry, "reason")?;
            Some(Recommendation {
                name,
                description,
                reason,
            })
        })
        .collect();

    if valid.is_empty() {
        anyhow::bail!("no well-formed recommendation entries in response");
    }
    Ok(valid)
}

/// Suggest complementary skills. Lenient contract: bounded retry with
/// exponential backoff on transport or parse failure, then the static
/// default list. Never an error to the caller.
pub async fn recommend_skills(
    client: &dyn GenerativeClient,
    cfg: &AiConfig,
    skills: &[UserSkillDetail],
) -> RecommendationsResponse {
    if skills.is_empty() {
        debug!("user has no skills, skipping generative call");
        return RecommendationsResponse {
            recommendations: Vec::new(),
            source: RecommendationSource::Empty,
        };
    }

    let prompt = recommendation_prompt(skills);
    let attempts = cfg.max_attempts.max(1);

    for attempt in 1..=attempts {
        let outcome = match client.generate(&prompt).await {
            Ok(text) => parse_recommendations(&text),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(mut recommendations) => {
                recommendations.truncate(MAX_RECOMMENDATIONS);
                info!(count = recommendations.len(), attempt, "recommendations generated");
                return RecommendationsResponse {
                    recommendations,
                    source: RecommendationSource::Model,
                };
            }
            Err(e) => {
                warn!(error = %e, attempt, "recommendation attempt failed");
                if attempt < attempts {
                    let delay = cfg.backoff_ms.saturating_mul(1 << (attempt - 1));
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    info!("recommendation retry budget exhausted, returning default list");
    RecommendationsResponse {
        recommendations: default_recommendations(),
        source: RecommendationSource::Default,
    }
}

/// Static fallback shown when the generative backend is unavailable.
pub fn default_recommendations() -> Vec<Recommendation> {
    vec![
        Recommendation {
            name: "Project Management".into(),
            description: "The practice of leading the work of a team to achieve desired outcomes within specific constraints.".into(),
            reason: "A universal skill that complements technical abilities with organizational competence.".into(),
        },
        Recommendation {
            name: "Data Analysis".into(),
            description: "The process of inspecting, cleansing, transforming, and modeling data to discover useful information.".into(),
            reason: "Growing in demand across virtually all industries and complementary to most technical skills.".into(),
        },
        Recommendation {
            name: "Public Speaking".into(),
            description: "The act of performing a speech to a live audience to inform, persuade or entertain.".into(),
            reason: "Enhances your ability to communicate ideas effectively regardless of your field.".into(),
        },
        Recommendation {
            name: "Technical Writing".into(),
            description: "Creating documentation that helps users understand and use a product or service.".into(),
            reason: "Critical for sharing knowledge and documenting processes in any technical role.".into(),
        },
        Recommendation {
            name: "Time Management".into(),
            description: "Planning and controlling how much time to spend on specific activities.".into(),
            reason: "Foundational for productivity and effectiveness in any professional context.".into(),
        },
    ]
}

#[cfg(test)]
mod ai_service_tests {
    use super::*;
    use axum::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use time::OffsetDateTime;
    use uuid::Uuid;

    /// Plays back a fixed sequence of responses, then errors.
    struct ScriptedModel {
        responses: Mutex<VecDeque<anyhow::Result<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(responses: Vec<anyhow::Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerativeClient for ScriptedModel {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")))
        }
    }

    fn test_cfg() -> AiConfig {
        AiConfig {
            api_key: "test".into(),
            model: "test-model".into(),
            base_url: "https://fake.local".into(),
            max_attempts: 3,
            backoff_ms: 1,
            request_timeout_secs: 1,
        }
    }

    fn some_skill(name: &str) -> UserSkillDetail {
        UserSkillDetail {
            skill_id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            proficiency_level: ProficiencyLevel::Intermediate,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn zero_skills_skips_the_backend_entirely() {
        let model = ScriptedModel::new(vec![]);
        let out = recommend_skills(&model, &test_cfg(), &[]).await;
        assert_eq!(out.source, RecommendationSource::Empty);
        assert!(out.recommendations.is_empty());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn transport_failure_every_attempt_yields_default_list() {
        let model = ScriptedModel::new(vec![
            Err(anyhow::anyhow!("timeout")),
            Err(anyhow::anyhow!("timeout")),
            Err(anyhow::anyhow!("timeout")),
        ]);
        let out = recommend_skills(&model, &test_cfg(), &[some_skill("Rust")]).await;
        assert_eq!(out.source, RecommendationSource::Default);
        assert_eq!(out.recommendations.len(), 5);
        assert_eq!(out.recommendations[0].name, "Project Management");
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn unparseable_then_valid_response_retries_and_succeeds() {
        let valid = r#"[{"name": "Kubernetes", "description": "Container orchestration", "reason": "Pairs with Docker"}]"#;
        let model = ScriptedModel::new(vec![
            Ok("I can't answer that as JSON, sorry.".into()),
            Ok(valid.into()),
        ]);
        let out = recommend_skills(&model, &test_cfg(), &[some_skill("Docker")]).await;
        assert_eq!(out.source, RecommendationSource::Model);
        assert_eq!(out.recommendations.len(), 1);
        assert_eq!(out.recommendations[0].name, "Kubernetes");
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn output_is_filtered_and_truncated_to_five() {
        let seven_entries: Vec<Value> = (0..7)
            .map(|i| {
                json!({
                    "name": format!("Skill {i}"),
                    "description": "d",
                    "reason": "r"
                })
            })
            .chain([json!({"name": "No reason given"})])
            .collect();
        let text = serde_json::to_string(&seven_entries).unwrap();
        let model = ScriptedModel::new(vec![Ok(text)]);

        let out = recommend_skills(&model, &test_cfg(), &[some_skill("Rust")]).await;
        assert_eq!(out.source, RecommendationSource::Model);
        assert_eq!(out.recommendations.len(), 5);
        assert!(out
            .recommendations
            .iter()
            .all(|r| !r.name.is_empty() && !r.reason.is_empty()));
    }

    #[tokio::test]
    async fn extraction_coerces_unknown_proficiency_to_intermediate() {
        let text = "```json\n[\
            {\"name\": \"Rust\", \"description\": \"Systems language\", \"proficiencyLevel\": \"Expert\"},\
            {\"name\": \"Cooking\", \"description\": \"\", \"proficiencyLevel\": \"Guru\"},\
            {\"name\": \"SQL\"}\
            ]\n```";
        let model = ScriptedModel::new(vec![Ok(text.into())]);
        let skills = extract_skills(&model, "some resume text").await.unwrap();
        assert_eq!(skills.len(), 3);
        assert_eq!(skills[0].proficiency_level, ProficiencyLevel::Expert);
        assert_eq!(skills[1].proficiency_level, ProficiencyLevel::Intermediate);
        assert_eq!(skills[2].proficiency_level, ProficiencyLevel::Intermediate);
    }

    #[tokio::test]
    async fn extraction_fails_on_nameless_entry() {
        let text = r#"[{"description": "mystery skill", "proficiencyLevel": "Beginner"}]"#;
        let model = ScriptedModel::new(vec![Ok(text.into())]);
        let err = extract_skills(&model, "text").await.unwrap_err();
        assert!(matches!(err, ExtractError::MissingName));
    }

    #[tokio::test]
    async fn extraction_fails_loudly_when_nothing_parses() {
        let model = ScriptedModel::new(vec![Ok("no structured data here at all".into())]);
        let err = extract_skills(&model, "text").await.unwrap_err();
        assert!(matches!(err, ExtractError::Unparseable));
        // Strict contract: one attempt, no silent retry into a guess
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn extraction_propagates_backend_failure() {
        let model = ScriptedModel::new(vec![Err(anyhow::anyhow!("HTTP 503"))]);
        let err = extract_skills(&model, "text").await.unwrap_err();
        assert!(matches!(err, ExtractError::Backend(_)));
    }
}
