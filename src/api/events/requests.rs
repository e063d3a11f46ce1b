use super::{AuditLogEntry, AuditQuery, EventQuery, EventRecord, EventStats};
use crate::api::{ApiClient, Page};
use crate::error::ApiError;
use crate::http::expect_json;
use reqwest::Method;
use uuid::Uuid;

fn events_path(project_key: &str, environment_id: Uuid) -> String {
    format!(
        "/projects/{}/environments/{}/events",
        project_key, environment_id
    )
}

impl ApiClient {
    pub async fn list_events(
        &self,
        project_key: &str,
        environment_id: Uuid,
        query: &EventQuery,
    ) -> Result<Page<EventRecord>, ApiError> {
        let request = self
            .http
            .request(Method::GET, &events_path(project_key, environment_id))
            .query(query);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn event_stats(
        &self,
        project_key: &str,
        environment_id: Uuid,
        query: &EventQuery,
    ) -> Result<EventStats, ApiError> {
        let path = format!("{}/stats", events_path(project_key, environment_id));
        let request = self.http.request(Method::GET, &path).query(query);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn list_audit_log(
        &self,
        project_key: &str,
        query: &AuditQuery,
    ) -> Result<Page<AuditLogEntry>, ApiError> {
        let path = format!("/projects/{}/audit-log", project_key);
        let request = self.http.request(Method::GET, &path).query(query);
        expect_json(self.http.send(request).await?).await
    }
}
