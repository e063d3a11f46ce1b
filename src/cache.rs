use crate::error::ApiError;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Cache key: ordered tuple of resource tag, scope ids, and an optional
/// canonicalized filter string. Two requests hit the same cache slot iff
/// their keys are equal; invalidation matches on key prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn push(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Append a canonical encoding of a filter object. serde_json maps are
    /// key-sorted by default, so structurally equal filters encode equally.
    /// A null/unit filter adds nothing.
    pub fn with_filters<T: Serialize>(self, filters: &T) -> Self {
        match serde_json::to_value(filters) {
            Ok(Value::Null) => self,
            Ok(value) => self.push(value.to_string()),
            Err(_) => self,
        }
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

struct CacheEntry {
    value: Value,
    fetched_at: Instant,
}

struct InFlight {
    rx: watch::Receiver<bool>,
    generation: u64,
    waiters: usize,
}

struct ErrorSlot {
    generation: u64,
    message: String,
    remaining: usize,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<QueryKey, CacheEntry>,
    in_flight: HashMap<QueryKey, InFlight>,
    // Failure messages per generation, so coalesced waiters can report the
    // leader's error without refetching themselves. A record exists only
    // while waiters of that generation have yet to observe it.
    errors: HashMap<QueryKey, ErrorSlot>,
    next_generation: u64,
}

/// Read-through cache over the admin API.
///
/// Each read declares a staleness window. Within the window a repeated read
/// returns the cached value with no network call; after it, the next read
/// serves the last-good value and refetches in the background. At most one
/// fetch is in flight per key — concurrent readers of the same key wait for
/// the leader's result instead of issuing their own request.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Mutex<Inner>>,
}

enum Action {
    Hit(Value),
    Wait(watch::Receiver<bool>, u64),
    Lead(u64, watch::Sender<bool>),
    ServeStaleAndRefresh(Value, u64, watch::Sender<bool>),
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: QueryKey,
        staleness: Duration,
        fetch: F,
    ) -> Result<Value, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
    {
        let mut fetch = Some(fetch);

        loop {
            let action = self.decide(&key, staleness);

            match action {
                Action::Hit(value) => return Ok(value),

                Action::Wait(mut rx, generation) => {
                    let _ = rx.changed().await;
                    let mut guard = self.inner.lock().expect("cache lock poisoned");
                    let mut leader_error = None;
                    let mut drained = false;
                    if let Some(slot) = guard.errors.get_mut(&key) {
                        if slot.generation == generation {
                            leader_error = Some(slot.message.clone());
                            slot.remaining = slot.remaining.saturating_sub(1);
                            drained = slot.remaining == 0;
                        }
                    }
                    if drained {
                        guard.errors.remove(&key);
                    }
                    drop(guard);
                    if let Some(message) = leader_error {
                        return Err(ApiError::Request(message));
                    }
                    // Entry was written, the leader was cancelled, or the
                    // fetch was abandoned by an invalidation. Either way,
                    // re-evaluate from the top.
                }

                Action::Lead(generation, tx) => {
                    let fut = (fetch.take().expect("fetch consumed twice"))();
                    let result = fut.await;
                    let out = self.complete(&key, generation, result);
                    let _ = tx.send(true);
                    return out;
                }

                Action::ServeStaleAndRefresh(value, generation, tx) => {
                    let fut = (fetch.take().expect("fetch consumed twice"))();
                    let cache = self.clone();
                    let key = key.clone();
                    tokio::spawn(async move {
                        let result = fut.await;
                        if let Err(e) = cache.complete(&key, generation, result) {
                            tracing::debug!("background refresh failed: {}", e);
                        }
                        let _ = tx.send(true);
                    });
                    return Ok(value);
                }
            }
        }
    }

    /// Drop every cached entry whose key starts with `prefix`, and abandon
    /// matching in-flight fetches so a racing response cannot resurrect
    /// invalidated data.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) {
        let mut guard = self.inner.lock().expect("cache lock poisoned");
        guard.entries.retain(|k, _| !k.starts_with(prefix));
        guard.errors.retain(|k, _| !k.starts_with(prefix));
        guard.in_flight.retain(|k, _| !k.starts_with(prefix));
    }

    pub fn clear(&self) {
        let mut guard = self.inner.lock().expect("cache lock poisoned");
        guard.entries.clear();
        guard.errors.clear();
        guard.in_flight.clear();
    }

    /// Cached value for a key regardless of staleness, if any.
    pub fn peek(&self, key: &QueryKey) -> Option<Value> {
        let guard = self.inner.lock().expect("cache lock poisoned");
        guard.entries.get(key).map(|e| e.value.clone())
    }

    #[cfg(test)]
    fn error_record_count(&self) -> usize {
        let guard = self.inner.lock().expect("cache lock poisoned");
        guard.errors.len()
    }

    fn decide(&self, key: &QueryKey, staleness: Duration) -> Action {
        let mut guard = self.inner.lock().expect("cache lock poisoned");

        let cached = guard
            .entries
            .get(key)
            .map(|e| (e.value.clone(), e.fetched_at.elapsed() < staleness));

        if let Some((value, true)) = &cached {
            return Action::Hit(value.clone());
        }

        let slot = guard
            .in_flight
            .get(key)
            .map(|f| (f.rx.has_changed().is_err(), f.rx.clone(), f.generation));
        if let Some((dead, rx, generation)) = slot {
            if dead {
                // The leader's future was dropped mid-fetch, so this slot
                // can never complete. Reclaim it and take leadership below.
                guard.in_flight.remove(key);
            } else {
                // A refetch is already running; keep serving the last-good
                // value if there is one, otherwise wait on the leader.
                if let Some((value, _)) = cached {
                    return Action::Hit(value);
                }
                if let Some(f) = guard.in_flight.get_mut(key) {
                    f.waiters += 1;
                }
                return Action::Wait(rx, generation);
            }
        }

        // Any lingering error record belongs to an older generation.
        guard.errors.remove(key);

        guard.next_generation += 1;
        let generation = guard.next_generation;
        let (tx, rx) = watch::channel(false);
        guard.in_flight.insert(
            key.clone(),
            InFlight {
                rx,
                generation,
                waiters: 0,
            },
        );

        match cached {
            Some((value, _)) => Action::ServeStaleAndRefresh(value, generation, tx),
            None => Action::Lead(generation, tx),
        }
    }

    fn complete(
        &self,
        key: &QueryKey,
        generation: u64,
        result: Result<Value, ApiError>,
    ) -> Result<Value, ApiError> {
        let mut guard = self.inner.lock().expect("cache lock poisoned");

        let live_waiters = match guard.in_flight.get(key) {
            Some(f) if f.generation == generation => Some(f.waiters),
            _ => None,
        };
        if live_waiters.is_some() {
            guard.in_flight.remove(key);
        }

        match result {
            Ok(value) => {
                if live_waiters.is_some() {
                    guard.entries.insert(
                        key.clone(),
                        CacheEntry {
                            value: value.clone(),
                            fetched_at: Instant::now(),
                        },
                    );
                    guard.errors.remove(key);
                }
                Ok(value)
            }
            Err(e) => {
                // Leave a record only if someone is waiting on this
                // generation; each waiter consumes one share and the last
                // one drops the record.
                if let Some(waiters) = live_waiters {
                    if waiters > 0 {
                        guard.errors.insert(
                            key.clone(),
                            ErrorSlot {
                                generation,
                                message: e.message(),
                                remaining: waiters,
                            },
                        );
                    }
                }
                Err(e)
            }
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
