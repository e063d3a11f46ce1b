pub mod requests;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

// MODELS

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: Uuid,
    pub project_key: String,
    pub name: String,
    pub key: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnvironmentRequest {
    pub name: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnvironmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// HELPER FUNCTIONS

/// Validate environment key format
pub fn validate_environment_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("Environment key cannot be empty".to_string());
    }

    if key.len() > 64 {
        return Err("Environment key is too long (Max: 64 characters)".to_string());
    }

    if !key.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err("Environment key must start with a letter".to_string());
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(
            "Environment key can only contain lowercase letters, numbers, underscores, and hyphens"
                .to_string(),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_environment_key() {
        assert!(validate_environment_key("production").is_ok());
        assert!(validate_environment_key("staging").is_ok());
        assert!(validate_environment_key("dev-test").is_ok());
        assert!(validate_environment_key("env_123").is_ok());

        assert!(validate_environment_key("").is_err());
        assert!(validate_environment_key("Production").is_err()); // uppercase
        assert!(validate_environment_key("_invalid").is_err()); // starts with underscore
        assert!(validate_environment_key("has space").is_err()); // space
        assert!(validate_environment_key("has.dot").is_err()); // dot
    }
}
