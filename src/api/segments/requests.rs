use super::{
    validate_segment_rules, CreateSegmentRequest, Segment, UpdateSegmentRequest,
};
use crate::api::{ApiClient, Page, PageQuery};
use crate::error::ApiError;
use crate::http::{expect_json, expect_ok};
use reqwest::Method;
use uuid::Uuid;

fn segments_path(project_key: &str, environment_id: Uuid) -> String {
    format!(
        "/projects/{}/environments/{}/segments",
        project_key, environment_id
    )
}

impl ApiClient {
    pub async fn list_segments(
        &self,
        project_key: &str,
        environment_id: Uuid,
        query: &PageQuery,
    ) -> Result<Page<Segment>, ApiError> {
        let request = self
            .http
            .request(Method::GET, &segments_path(project_key, environment_id))
            .query(query);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn get_segment(
        &self,
        project_key: &str,
        environment_id: Uuid,
        segment_id: Uuid,
    ) -> Result<Segment, ApiError> {
        let path = format!(
            "{}/{}",
            segments_path(project_key, environment_id),
            segment_id
        );
        let request = self.http.request(Method::GET, &path);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn create_segment(
        &self,
        project_key: &str,
        environment_id: Uuid,
        payload: &CreateSegmentRequest,
    ) -> Result<Segment, ApiError> {
        if payload.name.trim().is_empty() {
            return Err(ApiError::Validation("Segment name is required".to_string()));
        }
        validate_segment_rules(&payload.rules).map_err(ApiError::Validation)?;

        let request = self
            .http
            .request(Method::POST, &segments_path(project_key, environment_id))
            .json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn update_segment(
        &self,
        project_key: &str,
        environment_id: Uuid,
        segment_id: Uuid,
        payload: &UpdateSegmentRequest,
    ) -> Result<Segment, ApiError> {
        if let Some(rules) = &payload.rules {
            validate_segment_rules(rules).map_err(ApiError::Validation)?;
        }

        let path = format!(
            "{}/{}",
            segments_path(project_key, environment_id),
            segment_id
        );
        let request = self.http.request(Method::PUT, &path).json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn delete_segment(
        &self,
        project_key: &str,
        environment_id: Uuid,
        segment_id: Uuid,
    ) -> Result<(), ApiError> {
        let path = format!(
            "{}/{}",
            segments_path(project_key, environment_id),
            segment_id
        );
        let request = self.http.request(Method::DELETE, &path);
        expect_ok(self.http.send(request).await?).await
    }
}
