use super::{validate_project_key, CreateProjectRequest, Project, UpdateProjectRequest};
use crate::api::{ApiClient, Page, PageQuery};
use crate::error::ApiError;
use crate::http::{expect_json, expect_ok};
use reqwest::Method;

impl ApiClient {
    pub async fn list_projects(&self, query: &PageQuery) -> Result<Page<Project>, ApiError> {
        let request = self.http.request(Method::GET, "/projects").query(query);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn get_project(&self, project_key: &str) -> Result<Project, ApiError> {
        let path = format!("/projects/{}", project_key);
        let request = self.http.request(Method::GET, &path);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn create_project(
        &self,
        payload: &CreateProjectRequest,
    ) -> Result<Project, ApiError> {
        validate_project_key(&payload.key).map_err(ApiError::Validation)?;
        if payload.name.trim().is_empty() {
            return Err(ApiError::Validation("Project name is required".to_string()));
        }

        let request = self.http.request(Method::POST, "/projects").json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn update_project(
        &self,
        project_key: &str,
        payload: &UpdateProjectRequest,
    ) -> Result<Project, ApiError> {
        let path = format!("/projects/{}", project_key);
        let request = self.http.request(Method::PUT, &path).json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn delete_project(&self, project_key: &str) -> Result<(), ApiError> {
        let path = format!("/projects/{}", project_key);
        let request = self.http.request(Method::DELETE, &path);
        expect_ok(self.http.send(request).await?).await
    }
}
