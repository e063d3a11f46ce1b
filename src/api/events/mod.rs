pub mod requests;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};

// MODELS

/// A single analytics event as ingested by the SDKs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: Uuid,
    pub name: String,
    pub identity: Option<String>,
    #[serde(default)]
    pub properties: Value,
    pub occurred_at: DateTime<Utc>,
}

/// List filters for raw events. Serialized into the query string and into
/// the cache key, so a changed filter is a new key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub page: i32,
    pub size: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCountBucket {
    pub date: NaiveDate,
    pub count: i64,
}

/// Per-day aggregate, the slow-moving dashboard number (60s staleness).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub buckets: Vec<EventCountBucket>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor: String,
    pub action: String,
    pub resource_type: String,
    pub resource_key: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub page: i32,
    pub size: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_query_skips_unset_filters() {
        let bare = EventQuery {
            page: 0,
            size: 20,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            json!({"page": 0, "size": 20})
        );

        // Structurally equal queries must serialize identically, otherwise
        // they would land in different cache slots.
        let filtered = EventQuery {
            page: 0,
            size: 20,
            name: Some("flag_evaluated".to_string()),
            from: Some("2026-01-01T00:00:00Z".parse().unwrap()),
            to: None,
        };
        let value = serde_json::to_value(&filtered).unwrap();
        assert_eq!(value["name"], json!("flag_evaluated"));
        assert!(value.get("to").is_none());
    }

    #[test]
    fn test_audit_query_skips_unset_filters() {
        let bare = AuditQuery {
            page: 1,
            size: 50,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            json!({"page": 1, "size": 50})
        );

        let filtered = AuditQuery {
            page: 0,
            size: 20,
            actor: Some("admin@corp.com".to_string()),
            action: None,
        };
        let value = serde_json::to_value(&filtered).unwrap();
        assert_eq!(value["actor"], json!("admin@corp.com"));
        assert!(value.get("action").is_none());
    }

    #[test]
    fn test_event_record_defaults_missing_properties() {
        let record: EventRecord = serde_json::from_value(json!({
            "id": "9d2f3e46-9a6c-4b8e-8f7e-0a1b2c3d4e5f",
            "name": "flag_evaluated",
            "identity": null,
            "occurredAt": "2026-01-01T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(record.name, "flag_evaluated");
        assert_eq!(record.properties, Value::Null);
    }
}
