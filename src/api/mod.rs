use crate::config::Config;
use crate::http::HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod auth;
pub mod environments;
pub mod events;
pub mod flags;
pub mod projects;
pub mod segments;
pub mod webhooks;

/// Uniform envelope every list endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: i32,
    pub total_pages: i32,
    pub total_elements: i64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// Standard list parameters. Serialized both into the query string and into
/// cache keys, so identical filters always address the same cache slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: i32,
    pub size: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl PageQuery {
    pub fn new(page: i32, size: i32) -> Self {
        Self {
            page,
            size,
            sort: None,
        }
    }

    pub fn sorted_by(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(0, 20)
    }
}

/// Typed client over the admin API. Cloning is cheap; all clones share one
/// transport and token store.
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) http: Arc<HttpClient>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Arc::new(HttpClient::new(config)),
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_next() {
        let page = Page::<i32> {
            data: vec![],
            page: 0,
            total_pages: 3,
            total_elements: 41,
        };
        assert!(page.has_next());

        let last = Page::<i32> {
            data: vec![],
            page: 2,
            total_pages: 3,
            total_elements: 41,
        };
        assert!(!last.has_next());

        let empty = Page::<i32> {
            data: vec![],
            page: 0,
            total_pages: 0,
            total_elements: 0,
        };
        assert!(!empty.has_next());
    }
}
