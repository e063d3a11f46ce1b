use serde::Deserialize;
use thiserror::Error;

/// Body shape the server uses for non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Failure reported to a caller that shared another request's in-flight
    /// fetch; carries the leader's error message.
    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("session expired, sign in again")]
    SessionExpired,

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Build an `Api` error from a non-2xx response, consuming its body.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body: Option<ErrorBody> = response.json().await.ok();
        let (code, message) = match body {
            Some(b) => {
                let msg = b
                    .message
                    .unwrap_or_else(|| "request was rejected by the server".to_string());
                (b.code, msg)
            }
            None => (None, "request was rejected by the server".to_string()),
        };
        ApiError::Api {
            status,
            code,
            message,
        }
    }

    /// User-facing message. Recognized domain error codes get a specific
    /// message, everything else falls back to what the server sent.
    pub fn message(&self) -> String {
        if let ApiError::Api {
            code: Some(code),
            message,
            ..
        } = self
        {
            return match code.as_str() {
                "reset_token_invalid" => {
                    "This password reset link is invalid or has expired".to_string()
                }
                "reset_token_used" => {
                    "This password reset link has already been used".to_string()
                }
                "password_too_weak" => {
                    "Password is too weak, use at least 8 characters".to_string()
                }
                "key_already_exists" => {
                    "A resource with this key already exists".to_string()
                }
                _ => message.clone(),
            };
        }
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_maps_to_specific_message() {
        let err = ApiError::Api {
            status: 400,
            code: Some("reset_token_used".to_string()),
            message: "bad token".to_string(),
        };
        assert!(err.message().contains("already been used"));
    }

    #[test]
    fn test_unknown_code_falls_back_to_server_message() {
        let err = ApiError::Api {
            status: 422,
            code: Some("something_new".to_string()),
            message: "server said no".to_string(),
        };
        assert_eq!(err.message(), "server said no");
    }

    #[test]
    fn test_validation_message_passthrough() {
        let err = ApiError::Validation("Flag key cannot be empty".to_string());
        assert_eq!(err.message(), "Flag key cannot be empty");
    }

    #[test]
    fn test_status_is_exposed_for_api_errors_only() {
        let err = ApiError::Api {
            status: 404,
            code: None,
            message: "not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));

        assert_eq!(ApiError::SessionExpired.status(), None);
        assert_eq!(ApiError::Request("boom".to_string()).status(), None);
    }
}
