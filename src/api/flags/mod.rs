pub mod requests;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use chrono::{DateTime, Utc};

// MODELS

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagValueType {
    Boolean,
    String,
    Number,
    Json,
}

impl FlagValueType {
    /// Starting value for a freshly added targeting rule of this type.
    pub fn seed_value(&self) -> Value {
        match self {
            FlagValueType::Boolean => json!(true),
            FlagValueType::Number => json!(0),
            FlagValueType::Json => json!({}),
            FlagValueType::String => json!(""),
        }
    }

    /// Whether a raw JSON value is admissible for this flag type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FlagValueType::Boolean => value.is_boolean(),
            FlagValueType::Number => value.is_number(),
            FlagValueType::String => value.is_string(),
            FlagValueType::Json => true,
        }
    }
}

/// Segment reference as embedded in a flag's rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRef {
    pub id: Uuid,
    pub name: String,
}

/// A targeting rule as the server returns it, nested under its flag.
/// List order is evaluation priority: the first matching enabled rule wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetingRule {
    /// Absent means the rule applies to all users.
    pub segment: Option<SegmentRef>,
    pub rollout_percentage: i32,
    pub enabled: bool,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlag {
    pub project_key: String,
    pub environment_id: Uuid,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub value_type: FlagValueType,
    pub enabled: bool,
    pub default_value: Value,
    #[serde(default)]
    pub rules: Vec<TargetingRule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlagRequest {
    pub name: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value_type: FlagValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlagRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

/// One rule in a replace-all submission: segment id or absent, rollout,
/// enabled, typed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<Uuid>,
    pub rollout_percentage: i32,
    pub enabled: bool,
    pub value: Value,
}

/// The rule list is only ever persisted wholesale; there is no per-rule API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceRulesRequest {
    pub rules: Vec<RuleInput>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFlagOptions {
    pub delete_all_environments: bool,
}

// HELPER FUNCTIONS

/// Validate the flag key format before it goes to the server.
pub fn validate_flag_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("Flag key cannot be empty".to_string());
    }

    if key.len() > 64 {
        return Err("Flag key is too long (Max: 64 characters)".to_string());
    }

    if !key.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err("Flag key must start with a letter".to_string());
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(
            "Flag key can only contain lowercase letters, numbers, underscores, and hyphens"
                .to_string(),
        );
    }

    Ok(())
}

/// Rollout percentage must land in 0..=100.
pub fn validate_rollout_percentage(percentage: i32) -> Result<(), String> {
    if !(0..=100).contains(&percentage) {
        return Err("Rollout percentage must be between 0 and 100".to_string());
    }

    Ok(())
}
