use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
        }
    }

    pub fn from_env() -> Self {
        let _ = dotenv().is_ok();

        let base_url = env::var("FLAGDECK_BASE_URL")
            .expect("FLAGDECK_BASE_URL missing, it is required");

        let timeout_secs = env::var("FLAGDECK_TIMEOUT_SECS")
            .ok()
            .map(|v| v.parse().expect("FLAGDECK_TIMEOUT_SECS must be a valid u64"))
            .unwrap_or(30);

        Self {
            base_url,
            timeout_secs,
        }
    }

    /// Base URL with any trailing slash removed, so paths can be appended directly.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_strips_trailing_slash() {
        let config = Config::new("http://localhost:8080/");
        assert_eq!(config.base(), "http://localhost:8080");

        let config = Config::new("http://localhost:8080");
        assert_eq!(config.base(), "http://localhost:8080");
    }
}
