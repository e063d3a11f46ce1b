use crate::config::Config;
use crate::error::ApiError;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;

/// Access/refresh token pair as issued by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// HTTP transport for the admin API.
///
/// Attaches the stored bearer token to every request. A 401 response
/// triggers exactly one transparent refresh-and-retry for that request;
/// if the refresh fails (or the retry is rejected again) the stored
/// credentials are cleared and the session is considered over.
pub struct HttpClient {
    client: Client,
    base: String,
    tokens: Mutex<Option<TokenPair>>,
}

impl HttpClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("flagdeck-console/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base: config.base().to_string(),
            tokens: Mutex::new(None),
        }
    }

    pub async fn set_tokens(&self, tokens: TokenPair) {
        *self.tokens.lock().await = Some(tokens);
    }

    pub async fn clear_tokens(&self) {
        *self.tokens.lock().await = None;
    }

    pub async fn has_tokens(&self) -> bool {
        self.tokens.lock().await.is_some()
    }

    /// Build a request against an API path (leading slash expected).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base, path))
    }

    /// Send without attaching credentials (login, password reset).
    pub async fn send_unauthenticated(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        Ok(builder.send().await?)
    }

    /// Send with the stored bearer token, refreshing once on 401.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        // Clone before attaching auth so the retry can carry the new token.
        let retry = builder.try_clone();

        let used = self.current_access_token().await;
        let response = self.attach(builder, used.as_deref()).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(retry) = retry else {
            // Streaming bodies cannot be replayed.
            self.clear_tokens().await;
            return Err(ApiError::SessionExpired);
        };

        self.refresh(used).await?;

        let token = self.current_access_token().await;
        let response = self.attach(retry, token.as_deref()).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("request rejected again after token refresh");
            self.clear_tokens().await;
            return Err(ApiError::SessionExpired);
        }
        Ok(response)
    }

    fn attach(&self, builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        }
    }

    async fn current_access_token(&self) -> Option<String> {
        self.tokens
            .lock()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// Exchange the refresh token for a new pair. Holding the token lock for
    /// the whole call serializes concurrent refreshes; a request whose 401
    /// raced a refresh that already happened skips the exchange.
    async fn refresh(&self, used_access_token: Option<String>) -> Result<(), ApiError> {
        let mut guard = self.tokens.lock().await;

        let Some(current) = guard.clone() else {
            return Err(ApiError::SessionExpired);
        };

        if used_access_token.as_deref() != Some(current.access_token.as_str()) {
            // Another request already rotated the tokens.
            return Ok(());
        }

        tracing::debug!("access token rejected, refreshing session");

        let result = self
            .client
            .post(format!("{}/auth/refresh", self.base))
            .json(&serde_json::json!({ "refreshToken": current.refresh_token }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<TokenPair>().await {
                    Ok(pair) => {
                        *guard = Some(pair);
                        Ok(())
                    }
                    Err(_) => {
                        *guard = None;
                        Err(ApiError::SessionExpired)
                    }
                }
            }
            _ => {
                *guard = None;
                Err(ApiError::SessionExpired)
            }
        }
    }
}

/// Parse a 2xx response body, turning anything else into `ApiError::Api`.
pub async fn expect_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if !response.status().is_success() {
        return Err(ApiError::from_response(response).await);
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Discard the body of a 2xx response (delete endpoints return 204).
pub async fn expect_ok(response: Response) -> Result<(), ApiError> {
    if !response.status().is_success() {
        return Err(ApiError::from_response(response).await);
    }
    Ok(())
}
