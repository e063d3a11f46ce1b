use super::{
    validate_environment_key, CreateEnvironmentRequest, Environment, UpdateEnvironmentRequest,
};
use crate::api::{ApiClient, Page, PageQuery};
use crate::error::ApiError;
use crate::http::{expect_json, expect_ok};
use reqwest::Method;
use uuid::Uuid;

fn environments_path(project_key: &str) -> String {
    format!("/projects/{}/environments", project_key)
}

impl ApiClient {
    pub async fn list_environments(
        &self,
        project_key: &str,
        query: &PageQuery,
    ) -> Result<Page<Environment>, ApiError> {
        let request = self
            .http
            .request(Method::GET, &environments_path(project_key))
            .query(query);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn get_environment(
        &self,
        project_key: &str,
        environment_id: Uuid,
    ) -> Result<Environment, ApiError> {
        let path = format!("{}/{}", environments_path(project_key), environment_id);
        let request = self.http.request(Method::GET, &path);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn create_environment(
        &self,
        project_key: &str,
        payload: &CreateEnvironmentRequest,
    ) -> Result<Environment, ApiError> {
        validate_environment_key(&payload.key).map_err(ApiError::Validation)?;

        let request = self
            .http
            .request(Method::POST, &environments_path(project_key))
            .json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn update_environment(
        &self,
        project_key: &str,
        environment_id: Uuid,
        payload: &UpdateEnvironmentRequest,
    ) -> Result<Environment, ApiError> {
        let path = format!("{}/{}", environments_path(project_key), environment_id);
        let request = self.http.request(Method::PUT, &path).json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn delete_environment(
        &self,
        project_key: &str,
        environment_id: Uuid,
    ) -> Result<(), ApiError> {
        let path = format!("{}/{}", environments_path(project_key), environment_id);
        let request = self.http.request(Method::DELETE, &path);
        expect_ok(self.http.send(request).await?).await
    }
}
