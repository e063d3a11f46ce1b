use super::{validate_webhook_url, CreateWebhookRequest, UpdateWebhookRequest, Webhook};
use crate::api::{ApiClient, Page, PageQuery};
use crate::error::ApiError;
use crate::http::{expect_json, expect_ok};
use reqwest::Method;
use uuid::Uuid;

fn webhooks_path(project_key: &str) -> String {
    format!("/projects/{}/webhooks", project_key)
}

impl ApiClient {
    pub async fn list_webhooks(
        &self,
        project_key: &str,
        query: &PageQuery,
    ) -> Result<Page<Webhook>, ApiError> {
        let request = self
            .http
            .request(Method::GET, &webhooks_path(project_key))
            .query(query);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn create_webhook(
        &self,
        project_key: &str,
        payload: &CreateWebhookRequest,
    ) -> Result<Webhook, ApiError> {
        validate_webhook_url(&payload.url).map_err(ApiError::Validation)?;
        if payload.events.is_empty() {
            return Err(ApiError::Validation(
                "Webhook must subscribe to at least one event".to_string(),
            ));
        }

        let request = self
            .http
            .request(Method::POST, &webhooks_path(project_key))
            .json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn update_webhook(
        &self,
        project_key: &str,
        webhook_id: Uuid,
        payload: &UpdateWebhookRequest,
    ) -> Result<Webhook, ApiError> {
        if let Some(url) = &payload.url {
            validate_webhook_url(url).map_err(ApiError::Validation)?;
        }

        let path = format!("{}/{}", webhooks_path(project_key), webhook_id);
        let request = self.http.request(Method::PUT, &path).json(payload);
        expect_json(self.http.send(request).await?).await
    }

    pub async fn delete_webhook(
        &self,
        project_key: &str,
        webhook_id: Uuid,
    ) -> Result<(), ApiError> {
        let path = format!("{}/{}", webhooks_path(project_key), webhook_id);
        let request = self.http.request(Method::DELETE, &path);
        expect_ok(self.http.send(request).await?).await
    }
}
