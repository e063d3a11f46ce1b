use crate::api::environments::{CreateEnvironmentRequest, Environment, UpdateEnvironmentRequest};
use crate::api::events::{AuditLogEntry, AuditQuery, EventQuery, EventRecord, EventStats};
use crate::api::flags::{
    CreateFlagRequest, DeleteFlagOptions, FeatureFlag, ReplaceRulesRequest, UpdateFlagRequest,
};
use crate::api::projects::{CreateProjectRequest, Project, UpdateProjectRequest};
use crate::api::segments::{CreateSegmentRequest, Segment, UpdateSegmentRequest};
use crate::api::webhooks::{CreateWebhookRequest, UpdateWebhookRequest, Webhook};
use crate::api::{ApiClient, Page, PageQuery};
use crate::cache::{QueryCache, QueryKey};
use crate::config::Config;
use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

/// Lists and details are good for 30 seconds; aggregate stats for 60.
pub const LIST_STALENESS: Duration = Duration::from_secs(30);
pub const STATS_STALENESS: Duration = Duration::from_secs(60);

/// Cached facade over the admin API.
///
/// Reads go through the [`QueryCache`] under a key derived from the resource
/// tag, its scope ids, and the filter set. Mutations call the API directly
/// and, on success, invalidate exactly the scope prefix they touched —
/// list and detail keys together, never unrelated resource families.
#[derive(Clone)]
pub struct Console {
    api: ApiClient,
    cache: QueryCache,
}

impl Console {
    pub fn new(config: &Config) -> Self {
        Self {
            api: ApiClient::new(config),
            cache: QueryCache::new(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// End the session: forget the stored tokens and drop every cached
    /// value, so nothing read under the old account outlives it.
    pub async fn logout(&self) {
        self.api.logout().await;
        self.cache.clear();
    }

    async fn cached<T, F, Fut>(
        &self,
        key: QueryKey,
        staleness: Duration,
        fetch: F,
    ) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let value = self
            .cache
            .get_or_fetch(key, staleness, move || {
                let fut = fetch();
                async move {
                    let data = fut.await?;
                    Ok(serde_json::to_value(data)?)
                }
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // PROJECTS

    pub async fn projects(&self, query: &PageQuery) -> Result<Page<Project>, ApiError> {
        let key = QueryKey::new(["projects"]).with_filters(query);
        let api = self.api.clone();
        let query = query.clone();
        self.cached(key, LIST_STALENESS, move || async move {
            api.list_projects(&query).await
        })
        .await
    }

    pub async fn project(&self, project_key: &str) -> Result<Project, ApiError> {
        let key = QueryKey::new(["projects", project_key]);
        let api = self.api.clone();
        let project_key = project_key.to_string();
        self.cached(key, LIST_STALENESS, move || async move {
            api.get_project(&project_key).await
        })
        .await
    }

    pub async fn create_project(&self, payload: &CreateProjectRequest) -> Result<Project, ApiError> {
        let project = self.api.create_project(payload).await?;
        self.cache.invalidate_prefix(&QueryKey::new(["projects"]));
        Ok(project)
    }

    pub async fn update_project(
        &self,
        project_key: &str,
        payload: &UpdateProjectRequest,
    ) -> Result<Project, ApiError> {
        let project = self.api.update_project(project_key, payload).await?;
        self.cache.invalidate_prefix(&QueryKey::new(["projects"]));
        Ok(project)
    }

    pub async fn delete_project(&self, project_key: &str) -> Result<(), ApiError> {
        self.api.delete_project(project_key).await?;
        self.cache.invalidate_prefix(&QueryKey::new(["projects"]));
        // Everything scoped under the project is gone with it.
        for family in ["environments", "flags", "segments", "webhooks", "events", "audit"] {
            self.cache
                .invalidate_prefix(&QueryKey::new([family, project_key]));
        }
        Ok(())
    }

    // ENVIRONMENTS

    pub async fn environments(
        &self,
        project_key: &str,
        query: &PageQuery,
    ) -> Result<Page<Environment>, ApiError> {
        let key = QueryKey::new(["environments", project_key]).with_filters(query);
        let api = self.api.clone();
        let project_key = project_key.to_string();
        let query = query.clone();
        self.cached(key, LIST_STALENESS, move || async move {
            api.list_environments(&project_key, &query).await
        })
        .await
    }

    pub async fn environment(
        &self,
        project_key: &str,
        environment_id: Uuid,
    ) -> Result<Environment, ApiError> {
        let key = QueryKey::new(["environments", project_key]).push(environment_id.to_string());
        let api = self.api.clone();
        let project_key = project_key.to_string();
        self.cached(key, LIST_STALENESS, move || async move {
            api.get_environment(&project_key, environment_id).await
        })
        .await
    }

    pub async fn create_environment(
        &self,
        project_key: &str,
        payload: &CreateEnvironmentRequest,
    ) -> Result<Environment, ApiError> {
        let environment = self.api.create_environment(project_key, payload).await?;
        self.cache
            .invalidate_prefix(&QueryKey::new(["environments", project_key]));
        Ok(environment)
    }

    pub async fn update_environment(
        &self,
        project_key: &str,
        environment_id: Uuid,
        payload: &UpdateEnvironmentRequest,
    ) -> Result<Environment, ApiError> {
        let environment = self
            .api
            .update_environment(project_key, environment_id, payload)
            .await?;
        self.cache
            .invalidate_prefix(&QueryKey::new(["environments", project_key]));
        Ok(environment)
    }

    pub async fn delete_environment(
        &self,
        project_key: &str,
        environment_id: Uuid,
    ) -> Result<(), ApiError> {
        self.api
            .delete_environment(project_key, environment_id)
            .await?;
        self.cache
            .invalidate_prefix(&QueryKey::new(["environments", project_key]));
        // Flags, segments and events lived inside that environment.
        for family in ["flags", "segments", "events"] {
            self.cache.invalidate_prefix(
                &QueryKey::new([family, project_key]).push(environment_id.to_string()),
            );
        }
        Ok(())
    }

    // FLAGS

    pub async fn flags(
        &self,
        project_key: &str,
        environment_id: Uuid,
        query: &PageQuery,
    ) -> Result<Page<FeatureFlag>, ApiError> {
        let key = flag_scope(project_key, environment_id).with_filters(query);
        let api = self.api.clone();
        let project_key = project_key.to_string();
        let query = query.clone();
        self.cached(key, LIST_STALENESS, move || async move {
            api.list_flags(&project_key, environment_id, &query).await
        })
        .await
    }

    pub async fn flag(
        &self,
        project_key: &str,
        environment_id: Uuid,
        flag_key: &str,
    ) -> Result<FeatureFlag, ApiError> {
        let key = flag_scope(project_key, environment_id).push(flag_key);
        let api = self.api.clone();
        let project_key = project_key.to_string();
        let flag_key = flag_key.to_string();
        self.cached(key, LIST_STALENESS, move || async move {
            api.get_flag(&project_key, environment_id, &flag_key).await
        })
        .await
    }

    pub async fn create_flag(
        &self,
        project_key: &str,
        environment_id: Uuid,
        payload: &CreateFlagRequest,
    ) -> Result<FeatureFlag, ApiError> {
        let flag = self
            .api
            .create_flag(project_key, environment_id, payload)
            .await?;
        self.cache
            .invalidate_prefix(&flag_scope(project_key, environment_id));
        Ok(flag)
    }

    pub async fn update_flag(
        &self,
        project_key: &str,
        environment_id: Uuid,
        flag_key: &str,
        payload: &UpdateFlagRequest,
    ) -> Result<FeatureFlag, ApiError> {
        let flag = self
            .api
            .update_flag(project_key, environment_id, flag_key, payload)
            .await?;
        self.cache
            .invalidate_prefix(&flag_scope(project_key, environment_id));
        Ok(flag)
    }

    pub async fn delete_flag(
        &self,
        project_key: &str,
        environment_id: Uuid,
        flag_key: &str,
        options: &DeleteFlagOptions,
    ) -> Result<(), ApiError> {
        self.api
            .delete_flag(project_key, environment_id, flag_key, options)
            .await?;
        if options.delete_all_environments {
            self.cache
                .invalidate_prefix(&QueryKey::new(["flags", project_key]));
        } else {
            self.cache
                .invalidate_prefix(&flag_scope(project_key, environment_id));
        }
        Ok(())
    }

    pub async fn toggle_flag(
        &self,
        project_key: &str,
        environment_id: Uuid,
        flag_key: &str,
    ) -> Result<FeatureFlag, ApiError> {
        let flag = self
            .api
            .toggle_flag(project_key, environment_id, flag_key)
            .await?;
        self.cache
            .invalidate_prefix(&flag_scope(project_key, environment_id));
        Ok(flag)
    }

    /// Atomic replace of the flag's whole rule list; the saved order is the
    /// server's evaluation order.
    pub async fn replace_flag_rules(
        &self,
        project_key: &str,
        environment_id: Uuid,
        flag_key: &str,
        payload: &ReplaceRulesRequest,
    ) -> Result<FeatureFlag, ApiError> {
        let flag = self
            .api
            .replace_flag_rules(project_key, environment_id, flag_key, payload)
            .await?;
        self.cache
            .invalidate_prefix(&flag_scope(project_key, environment_id));
        Ok(flag)
    }

    // SEGMENTS

    pub async fn segments(
        &self,
        project_key: &str,
        environment_id: Uuid,
        query: &PageQuery,
    ) -> Result<Page<Segment>, ApiError> {
        let key = segment_scope(project_key, environment_id).with_filters(query);
        let api = self.api.clone();
        let project_key = project_key.to_string();
        let query = query.clone();
        self.cached(key, LIST_STALENESS, move || async move {
            api.list_segments(&project_key, environment_id, &query).await
        })
        .await
    }

    pub async fn segment(
        &self,
        project_key: &str,
        environment_id: Uuid,
        segment_id: Uuid,
    ) -> Result<Segment, ApiError> {
        let key = segment_scope(project_key, environment_id).push(segment_id.to_string());
        let api = self.api.clone();
        let project_key = project_key.to_string();
        self.cached(key, LIST_STALENESS, move || async move {
            api.get_segment(&project_key, environment_id, segment_id)
                .await
        })
        .await
    }

    pub async fn create_segment(
        &self,
        project_key: &str,
        environment_id: Uuid,
        payload: &CreateSegmentRequest,
    ) -> Result<Segment, ApiError> {
        let segment = self
            .api
            .create_segment(project_key, environment_id, payload)
            .await?;
        self.cache
            .invalidate_prefix(&segment_scope(project_key, environment_id));
        Ok(segment)
    }

    pub async fn update_segment(
        &self,
        project_key: &str,
        environment_id: Uuid,
        segment_id: Uuid,
        payload: &UpdateSegmentRequest,
    ) -> Result<Segment, ApiError> {
        let segment = self
            .api
            .update_segment(project_key, environment_id, segment_id, payload)
            .await?;
        self.cache
            .invalidate_prefix(&segment_scope(project_key, environment_id));
        Ok(segment)
    }

    pub async fn delete_segment(
        &self,
        project_key: &str,
        environment_id: Uuid,
        segment_id: Uuid,
    ) -> Result<(), ApiError> {
        self.api
            .delete_segment(project_key, environment_id, segment_id)
            .await?;
        self.cache
            .invalidate_prefix(&segment_scope(project_key, environment_id));
        Ok(())
    }

    // WEBHOOKS

    pub async fn webhooks(
        &self,
        project_key: &str,
        query: &PageQuery,
    ) -> Result<Page<Webhook>, ApiError> {
        let key = QueryKey::new(["webhooks", project_key]).with_filters(query);
        let api = self.api.clone();
        let project_key = project_key.to_string();
        let query = query.clone();
        self.cached(key, LIST_STALENESS, move || async move {
            api.list_webhooks(&project_key, &query).await
        })
        .await
    }

    pub async fn create_webhook(
        &self,
        project_key: &str,
        payload: &CreateWebhookRequest,
    ) -> Result<Webhook, ApiError> {
        let webhook = self.api.create_webhook(project_key, payload).await?;
        self.cache
            .invalidate_prefix(&QueryKey::new(["webhooks", project_key]));
        Ok(webhook)
    }

    pub async fn update_webhook(
        &self,
        project_key: &str,
        webhook_id: Uuid,
        payload: &UpdateWebhookRequest,
    ) -> Result<Webhook, ApiError> {
        let webhook = self
            .api
            .update_webhook(project_key, webhook_id, payload)
            .await?;
        self.cache
            .invalidate_prefix(&QueryKey::new(["webhooks", project_key]));
        Ok(webhook)
    }

    pub async fn delete_webhook(
        &self,
        project_key: &str,
        webhook_id: Uuid,
    ) -> Result<(), ApiError> {
        self.api.delete_webhook(project_key, webhook_id).await?;
        self.cache
            .invalidate_prefix(&QueryKey::new(["webhooks", project_key]));
        Ok(())
    }

    // EVENTS & AUDIT

    pub async fn events(
        &self,
        project_key: &str,
        environment_id: Uuid,
        query: &EventQuery,
    ) -> Result<Page<EventRecord>, ApiError> {
        let key = QueryKey::new(["events", project_key])
            .push(environment_id.to_string())
            .with_filters(query);
        let api = self.api.clone();
        let project_key = project_key.to_string();
        let query = query.clone();
        self.cached(key, LIST_STALENESS, move || async move {
            api.list_events(&project_key, environment_id, &query).await
        })
        .await
    }

    pub async fn event_stats(
        &self,
        project_key: &str,
        environment_id: Uuid,
        query: &EventQuery,
    ) -> Result<EventStats, ApiError> {
        let key = QueryKey::new(["events", project_key])
            .push(environment_id.to_string())
            .push("stats")
            .with_filters(query);
        let api = self.api.clone();
        let project_key = project_key.to_string();
        let query = query.clone();
        self.cached(key, STATS_STALENESS, move || async move {
            api.event_stats(&project_key, environment_id, &query).await
        })
        .await
    }

    pub async fn audit_log(
        &self,
        project_key: &str,
        query: &AuditQuery,
    ) -> Result<Page<AuditLogEntry>, ApiError> {
        let key = QueryKey::new(["audit", project_key]).with_filters(query);
        let api = self.api.clone();
        let project_key = project_key.to_string();
        let query = query.clone();
        self.cached(key, LIST_STALENESS, move || async move {
            api.list_audit_log(&project_key, &query).await
        })
        .await
    }
}

fn flag_scope(project_key: &str, environment_id: Uuid) -> QueryKey {
    QueryKey::new(["flags", project_key]).push(environment_id.to_string())
}

fn segment_scope(project_key: &str, environment_id: Uuid) -> QueryKey {
    QueryKey::new(["segments", project_key]).push(environment_id.to_string())
}

/// Accumulator for infinite-scroll lists. Pages pile up in fetch order;
/// changing any filter means starting a new accumulator (a new cache key).
#[derive(Debug, Clone, Default)]
pub struct InfinitePages<T> {
    pages: Vec<Page<T>>,
}

impl<T> InfinitePages<T> {
    pub fn new() -> Self {
        Self { pages: Vec::new() }
    }

    /// True until the last fetched page says otherwise. An empty accumulator
    /// reports true so the first fetch happens.
    pub fn has_next(&self) -> bool {
        self.pages.last().map(Page::has_next).unwrap_or(true)
    }

    pub fn next_page(&self) -> i32 {
        self.pages.last().map(|p| p.page + 1).unwrap_or(0)
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.pages.iter().flat_map(|p| p.data.iter())
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(|p| p.data.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_elements(&self) -> i64 {
        self.pages.last().map(|p| p.total_elements).unwrap_or(0)
    }

    /// Fetch and append the next page. Returns false (without calling the
    /// loader) when the collection is exhausted.
    pub async fn fetch_next<F, Fut>(&mut self, load: F) -> Result<bool, ApiError>
    where
        F: FnOnce(i32) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        if !self.has_next() {
            return Ok(false);
        }
        let page = load(self.next_page()).await?;
        self.pages.push(page);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page_no: i32, total_pages: i32, data: Vec<i32>) -> Page<i32> {
        Page {
            data,
            page: page_no,
            total_pages,
            total_elements: 5,
        }
    }

    #[tokio::test]
    async fn test_infinite_pages_accumulate_in_order() {
        let mut pages = InfinitePages::new();

        assert!(pages.has_next());
        assert_eq!(pages.next_page(), 0);

        let fetched = pages
            .fetch_next(|n| async move { Ok(page(n, 3, vec![1, 2])) })
            .await
            .unwrap();
        assert!(fetched);

        pages
            .fetch_next(|n| async move { Ok(page(n, 3, vec![3, 4])) })
            .await
            .unwrap();
        pages
            .fetch_next(|n| async move { Ok(page(n, 3, vec![5])) })
            .await
            .unwrap();

        assert!(!pages.has_next());
        assert_eq!(pages.items().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(pages.len(), 5);

        // Exhausted: loader must not run again.
        let calls = std::cell::Cell::new(0);
        let fetched = pages
            .fetch_next(|n| {
                calls.set(calls.get() + 1);
                async move { Ok(page(n, 3, vec![])) }
            })
            .await
            .unwrap();
        assert!(!fetched);
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_infinite_pages_failed_fetch_keeps_accumulated() {
        let mut pages = InfinitePages::new();
        pages
            .fetch_next(|n| async move { Ok(page(n, 3, vec![1, 2])) })
            .await
            .unwrap();

        let err = pages
            .fetch_next(|_| async move {
                Err::<Page<i32>, _>(ApiError::Request("offline".to_string()))
            })
            .await;
        assert!(err.is_err());

        assert_eq!(pages.len(), 2);
        assert_eq!(pages.next_page(), 1);
    }
}
