use crate::api::ApiClient;
use crate::error::ApiError;
use crate::http::{expect_json, expect_ok, TokenPair};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetConfirmRequest<'a> {
    token: &'a str,
    new_password: &'a str,
}

impl ApiClient {
    /// Exchange credentials for a token pair and store it on the transport.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        if email.trim().is_empty() || password.len() < 8 {
            return Err(ApiError::Validation(
                "Email is required and password must be at least 8 characters".to_string(),
            ));
        }

        let request = self
            .http
            .request(reqwest::Method::POST, "/auth/login")
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            });
        let response = self.http.send_unauthenticated(request).await?;
        let tokens: TokenPair = expect_json(response).await?;
        self.http.set_tokens(tokens).await;
        Ok(())
    }

    /// Forget the stored session. The access token simply ages out
    /// server-side; nothing to revoke remotely.
    pub async fn logout(&self) {
        self.http.clear_tokens().await;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.http.has_tokens().await
    }

    /// Ask the server to email a password reset link. Always unauthenticated.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        if email.trim().is_empty() {
            return Err(ApiError::Validation("Email is required".to_string()));
        }

        let request = self
            .http
            .request(reqwest::Method::POST, "/auth/password-reset/request")
            .json(&serde_json::json!({ "email": email }));
        expect_ok(self.http.send_unauthenticated(request).await?).await
    }

    /// Complete a password reset. Domain errors (`reset_token_invalid`,
    /// `reset_token_used`, `password_too_weak`) come back as `ApiError::Api`
    /// with a recognized code; see [`ApiError::message`].
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        if new_password.len() < 8 {
            return Err(ApiError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let request = self
            .http
            .request(reqwest::Method::POST, "/auth/password-reset/confirm")
            .json(&ResetConfirmRequest {
                token,
                new_password,
            });
        expect_ok(self.http.send_unauthenticated(request).await?).await
    }
}
