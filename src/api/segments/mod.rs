pub mod requests;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use chrono::{DateTime, Utc};

// MODELS

/// Closed set of matching operators for segment rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentOperator {
    Eq,
    Neq,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    Exists,
    NotExists,
    In,
    NotIn,
}

impl SegmentOperator {
    /// Presence checks carry no comparison value; everything else needs one.
    pub fn requires_value(&self) -> bool {
        !matches!(self, SegmentOperator::Exists | SegmentOperator::NotExists)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRule {
    pub field: String,
    pub operator: SegmentOperator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: Uuid,
    pub environment_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub rules: Vec<SegmentRule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSegmentRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rules: Vec<SegmentRule>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSegmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<SegmentRule>>,
}

// HELPER FUNCTIONS

/// Segments must always carry at least one rule, and each rule must be
/// consistent with its operator. Checked before submit; the server enforces
/// the same constraints.
pub fn validate_segment_rules(rules: &[SegmentRule]) -> Result<(), String> {
    if rules.is_empty() {
        return Err("Segment must have at least one rule".to_string());
    }

    for rule in rules {
        if rule.field.trim().is_empty() {
            return Err("Rule field cannot be empty".to_string());
        }
        if rule.operator.requires_value() && rule.value.is_none() {
            return Err(format!(
                "Rule on field '{}' needs a comparison value",
                rule.field
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(field: &str, operator: SegmentOperator, value: Option<Value>) -> SegmentRule {
        SegmentRule {
            field: field.to_string(),
            operator,
            value,
        }
    }

    #[test]
    fn test_zero_rules_fails_validation() {
        assert!(validate_segment_rules(&[]).is_err());
    }

    #[test]
    fn test_valid_rules_pass() {
        let rules = vec![
            rule("email", SegmentOperator::EndsWith, Some(json!("@corp.com"))),
            rule("plan", SegmentOperator::In, Some(json!(["pro", "team"]))),
            rule("beta_opt_in", SegmentOperator::Exists, None),
        ];
        assert!(validate_segment_rules(&rules).is_ok());
    }

    #[test]
    fn test_missing_value_fails_for_comparison_operators() {
        let rules = vec![rule("country", SegmentOperator::Eq, None)];
        assert!(validate_segment_rules(&rules).is_err());
    }

    #[test]
    fn test_empty_field_fails() {
        let rules = vec![rule("  ", SegmentOperator::Exists, None)];
        assert!(validate_segment_rules(&rules).is_err());
    }

    #[test]
    fn test_operator_wire_names() {
        assert_eq!(
            serde_json::to_value(SegmentOperator::NotContains).unwrap(),
            json!("not_contains")
        );
        assert_eq!(
            serde_json::from_value::<SegmentOperator>(json!("starts_with")).unwrap(),
            SegmentOperator::StartsWith
        );
        assert!(serde_json::from_value::<SegmentOperator>(json!("matches")).is_err());
    }
}
