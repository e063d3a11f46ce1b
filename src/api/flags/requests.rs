use super::{
    validate_flag_key, validate_rollout_percentage, CreateFlagRequest, DeleteFlagOptions,
    FeatureFlag, ReplaceRulesRequest, UpdateFlagRequest,
};
use crate::api::{ApiClient, Page, PageQuery};
use crate::error::ApiError;
use crate::http::{expect_json, expect_ok};
use reqwest::Method;
use uuid::Uuid;

fn flags_path(project_key: &str, environment_id: Uuid) -> String {
    format!(
        "/projects/{}/environments/{}/flags",
        project_key, environment_id
    )
}

impl ApiClient {
    pub async fn list_flags(
        &self,
        project_key: &str,
        environment_id: Uuid,
        query: &PageQuery,
    ) -> Result<Page<FeatureFlag>, ApiError> {
        let request = self
            .http
            .request(Method::GET, &flags_path(project_key, environment_id))
            .query(query);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn get_flag(
        &self,
        project_key: &str,
        environment_id: Uuid,
        flag_key: &str,
    ) -> Result<FeatureFlag, ApiError> {
        let path = format!("{}/{}", flags_path(project_key, environment_id), flag_key);
        let request = self.http.request(Method::GET, &path);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn create_flag(
        &self,
        project_key: &str,
        environment_id: Uuid,
        payload: &CreateFlagRequest,
    ) -> Result<FeatureFlag, ApiError> {
        validate_flag_key(&payload.key).map_err(ApiError::Validation)?;

        if let Some(value) = &payload.default_value {
            if !payload.value_type.accepts(value) {
                return Err(ApiError::Validation(
                    "Default value does not match the flag's value type".to_string(),
                ));
            }
        }

        let request = self
            .http
            .request(Method::POST, &flags_path(project_key, environment_id))
            .json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn update_flag(
        &self,
        project_key: &str,
        environment_id: Uuid,
        flag_key: &str,
        payload: &UpdateFlagRequest,
    ) -> Result<FeatureFlag, ApiError> {
        let path = format!("{}/{}", flags_path(project_key, environment_id), flag_key);
        let request = self.http.request(Method::PUT, &path).json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn delete_flag(
        &self,
        project_key: &str,
        environment_id: Uuid,
        flag_key: &str,
        options: &DeleteFlagOptions,
    ) -> Result<(), ApiError> {
        let path = format!("{}/{}", flags_path(project_key, environment_id), flag_key);
        let request = self.http.request(Method::DELETE, &path).query(options);
        expect_ok(self.http.send(request).await?).await
    }

    /// Replace the flag's entire rule list in one atomic call. Submission
    /// order is the server's evaluation order.
    pub async fn replace_flag_rules(
        &self,
        project_key: &str,
        environment_id: Uuid,
        flag_key: &str,
        payload: &ReplaceRulesRequest,
    ) -> Result<FeatureFlag, ApiError> {
        for rule in &payload.rules {
            validate_rollout_percentage(rule.rollout_percentage).map_err(ApiError::Validation)?;
        }

        let path = format!(
            "{}/{}/rules",
            flags_path(project_key, environment_id),
            flag_key
        );
        let request = self.http.request(Method::PUT, &path).json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn toggle_flag(
        &self,
        project_key: &str,
        environment_id: Uuid,
        flag_key: &str,
    ) -> Result<FeatureFlag, ApiError> {
        let path = format!(
            "{}/{}/toggle",
            flags_path(project_key, environment_id),
            flag_key
        );
        let request = self.http.request(Method::POST, &path);
        expect_json(self.http.send(request).await?).await
    }
}
