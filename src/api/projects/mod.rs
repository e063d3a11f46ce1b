pub mod requests;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

// MODELS

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// HELPER FUNCTIONS

/// Project keys share the flag key format: lowercase, digits, `_`, `-`,
/// starting with a letter, at most 64 characters.
pub fn validate_project_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("Project key cannot be empty".to_string());
    }

    if key.len() > 64 {
        return Err("Project key is too long (Max: 64 characters)".to_string());
    }

    if !key.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err("Project key must start with a letter".to_string());
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(
            "Project key can only contain lowercase letters, numbers, underscores, and hyphens"
                .to_string(),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_project_key() {
        assert!(validate_project_key("mobile-app").is_ok());
        assert!(validate_project_key("backend_v2").is_ok());

        assert!(validate_project_key("").is_err());
        assert!(validate_project_key("Mobile").is_err());
        assert!(validate_project_key("2fast").is_err());
        assert!(validate_project_key("has.dot").is_err());
    }
}
