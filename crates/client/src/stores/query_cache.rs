//! Keyed cache of server responses with request coalescing.
//!
//! Each key holds at most one cached value and at most one request in flight.
//! Concurrent `fetch` calls for the same key await the same request.
//! `invalidate` marks matching entries stale; the next `fetch` refetches.
//! A request that was in flight when its key was invalidated still delivers
//! its result to the callers awaiting it, but the stored copy is already
//! stale. Reads after the invalidation never join it; they start a new
//! request that replaces it.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::time::Instant;
use wiredesk_shared::ApiError;

use super::QueryKey;

type AnyValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<AnyValue, ApiError>>>;

struct Cached {
    data: AnyValue,
    fetched_at: Instant,
    stale: bool,
}

struct InFlight {
    id: u64,
    /// Entry generation when the request started.
    generation: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct Entry {
    cached: Option<Cached>,
    inflight: Option<InFlight>,
    /// Bumped by every invalidation.
    generation: u64,
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    stale_time: Duration,
    next_fetch_id: Mutex<u64>,
    revision: watch::Sender<u64>,
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

enum Plan {
    Hit(AnyValue),
    Await { id: u64, generation: u64, fetch: SharedFetch },
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                stale_time,
                next_fetch_id: Mutex::new(0),
                revision,
            }),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_fetch_id(&self) -> u64 {
        let mut next = self
            .inner
            .next_fetch_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *next += 1;
        *next
    }

    fn bump_revision(&self) {
        self.inner.revision.send_modify(|rev| *rev += 1);
    }

    /// Ticks whenever cached data changes or is invalidated. Views use it to
    /// know when to re-read.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Return the fresh cached value for `key`, or join or start a request.
    ///
    /// `fetcher` is only called when a new request is actually needed.
    /// Failed requests are not cached.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let plan = {
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_default();

            let fresh = entry.cached.as_ref().filter(|cached| {
                !cached.stale
                    && cached.fetched_at.elapsed() < self.inner.stale_time
                    && cached.data.is::<T>()
            });

            if let Some(cached) = fresh {
                Plan::Hit(Arc::clone(&cached.data))
            } else if let Some(inflight) = entry
                .inflight
                .as_ref()
                .filter(|inflight| inflight.generation == entry.generation)
            {
                crate::log_debug!("Joining in-flight request for {}", key);
                Plan::Await {
                    id: inflight.id,
                    generation: inflight.generation,
                    fetch: inflight.fetch.clone(),
                }
            } else {
                crate::log_debug!("Fetching {}", key);
                let request = fetcher();
                let fetch = async move { request.await.map(|value| Arc::new(value) as AnyValue) }
                    .boxed()
                    .shared();
                let id = self.next_fetch_id();
                entry.inflight = Some(InFlight {
                    id,
                    generation: entry.generation,
                    fetch: fetch.clone(),
                });
                Plan::Await {
                    id,
                    generation: entry.generation,
                    fetch,
                }
            }
        };

        let data = match plan {
            Plan::Hit(data) => data,
            Plan::Await {
                id,
                generation,
                fetch,
            } => {
                let result = fetch.await;
                self.complete(key, id, generation, &result);
                result?
            }
        };

        data.downcast_ref::<T>().cloned().ok_or_else(|| {
            ApiError::Deserialize(format!("cached value for {key} has an unexpected type"))
        })
    }

    /// Record the outcome of request `id`. Every awaiter calls this; only the
    /// first one for a given request has any effect.
    fn complete(&self, key: &QueryKey, id: u64, generation: u64, result: &Result<AnyValue, ApiError>) {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.inflight.as_ref().map(|f| f.id) != Some(id) {
            return;
        }
        entry.inflight = None;

        match result {
            Ok(data) => {
                entry.cached = Some(Cached {
                    data: Arc::clone(data),
                    fetched_at: Instant::now(),
                    stale: entry.generation != generation,
                });
                drop(entries);
                self.bump_revision();
            }
            Err(e) => crate::log_warn!("Request for {} failed: {}", key, e),
        }
    }

    /// Mark every entry under `prefix` stale.
    pub fn invalidate(&self, prefix: &QueryKey) {
        let mut matched = 0;
        {
            let mut entries = self.entries();
            for (key, entry) in entries.iter_mut() {
                if key.starts_with(prefix) {
                    entry.generation += 1;
                    if let Some(cached) = entry.cached.as_mut() {
                        cached.stale = true;
                    }
                    matched += 1;
                }
            }
        }
        crate::log_debug!("Invalidated {} ({} entries)", prefix, matched);
        if matched > 0 {
            self.bump_revision();
        }
    }

    /// Last stored value for `key`, fresh or not.
    pub fn peek<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.entries()
            .get(key)
            .and_then(|entry| entry.cached.as_ref())
            .and_then(|cached| cached.data.downcast_ref::<T>().cloned())
    }

    /// Whether `key` has no usable value and the next `fetch` will hit the server.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries()
            .get(key)
            .and_then(|entry| entry.cached.as_ref())
            .map_or(true, |cached| {
                cached.stale || cached.fetched_at.elapsed() >= self.inner.stale_time
            })
    }

    /// Drop every entry under `prefix`, including stored values.
    pub fn remove(&self, prefix: &QueryKey) {
        self.entries().retain(|key, _| !key.starts_with(prefix));
        self.bump_revision();
    }

    pub fn clear(&self) {
        self.entries().clear();
        self.bump_revision();
    }
}
