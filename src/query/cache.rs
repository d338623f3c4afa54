//! Key-based query cache with interval refetching.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{Fetcher, Payload, QueryKey};
use crate::data::{
    DependencyGraph, ServiceDependencies, ServiceHealth, ServiceMetricsDetail, TimeRange,
    TraceDetail, TraceInfo,
};
use crate::error::ApiError;

/// Cached state of one query.
#[derive(Debug, Default)]
struct Entry {
    payload: Option<Payload>,
    error: Option<ApiError>,
    in_flight: bool,
    generation: u64,
    /// When the last fetch finished (successfully or not).
    settled_at: Option<Instant>,
    /// When the last successful fetch finished.
    updated_at: Option<Instant>,
}

/// Result of a background fetch, sent back to the UI thread.
#[derive(Debug)]
struct Completion {
    key: QueryKey,
    generation: u64,
    result: Result<Payload, ApiError>,
}

/// A borrowed view of a query's state, typed to its payload.
#[derive(Debug)]
pub struct Query<'a, T> {
    /// Last successfully fetched data (kept while refetching or after a failed refetch).
    pub data: Option<&'a T>,
    /// Error of the most recent fetch, cleared by the next success.
    pub error: Option<&'a ApiError>,
    pub in_flight: bool,
    pub updated_at: Option<Instant>,
}

impl<T> Clone for Query<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Query<'_, T> {}

impl<'a, T> Query<'a, T> {
    fn idle() -> Self {
        Self {
            data: None,
            error: None,
            in_flight: false,
            updated_at: None,
        }
    }

    /// Nothing to show yet: no data and no error.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }
}

/// Caches query results by [`QueryKey`] and refetches them in the background.
///
/// Fetches run on the tokio runtime and report back through a channel that
/// [`QueryCache::poll`] drains without blocking, once per UI loop iteration.
/// A key has at most one fetch in flight. Keys that are released while a
/// fetch is in flight have the late result discarded.
pub struct QueryCache {
    fetcher: Arc<dyn Fetcher>,
    runtime: Handle,
    refetch_interval: Duration,
    entries: HashMap<QueryKey, Entry>,
    next_generation: u64,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    discarded: u64,
}

impl QueryCache {
    /// Create a cache spawning fetches on `runtime`.
    pub fn new(fetcher: Arc<dyn Fetcher>, runtime: Handle, refetch_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            fetcher,
            runtime,
            refetch_interval,
            entries: HashMap::new(),
            next_generation: 0,
            tx,
            rx,
            discarded: 0,
        }
    }

    /// Interval after which auto-refreshing keys are fetched again.
    pub fn refetch_interval(&self) -> Duration {
        self.refetch_interval
    }

    /// Register `key` and fetch it if it has never been fetched, or if it
    /// auto-refreshes and the refetch interval has elapsed.
    pub fn ensure(&mut self, key: &QueryKey) {
        let due = match self.entries.get(key) {
            None => true,
            Some(entry) => {
                !entry.in_flight
                    && key.auto_refresh()
                    && entry.settled_at.is_none_or(|t| t.elapsed() >= self.refetch_interval)
            }
        };
        if due {
            self.start_fetch(key.clone());
        }
    }

    /// Fetch `key` now unless a fetch is already in flight.
    pub fn refetch(&mut self, key: &QueryKey) {
        let in_flight = self.entries.get(key).is_some_and(|e| e.in_flight);
        if !in_flight {
            self.start_fetch(key.clone());
        }
    }

    /// Refetch every registered key that is not already in flight.
    pub fn refetch_all(&mut self) {
        let keys: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|(_, e)| !e.in_flight)
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            self.start_fetch(key);
        }
    }

    /// Drop `key` from the cache. Returns whether it was registered.
    pub fn release(&mut self, key: &QueryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Release every key for which `keep` returns false.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: Fn(&QueryKey) -> bool,
    {
        self.entries.retain(|key, _| {
            let kept = keep(key);
            if !kept {
                debug!(?key, "releasing query");
            }
            kept
        });
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.entries.values().filter(|e| e.in_flight).count()
    }

    /// Number of results thrown away because their key was released.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Apply finished fetches. Returns how many results were stored.
    ///
    /// This method is non-blocking.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            let Completion {
                key,
                generation,
                result,
            } = completion;

            let Some(entry) = self.entries.get_mut(&key).filter(|e| e.generation == generation)
            else {
                debug!(?key, generation, "discarding result for released query");
                self.discarded += 1;
                continue;
            };

            let now = Instant::now();
            entry.in_flight = false;
            entry.settled_at = Some(now);
            match result {
                Ok(payload) => {
                    debug!(?key, "query updated");
                    entry.payload = Some(payload);
                    entry.error = None;
                    entry.updated_at = Some(now);
                }
                Err(err) => {
                    warn!(?key, error = %err, "query failed");
                    entry.error = Some(err);
                }
            }
            applied += 1;
        }
        applied
    }

    /// When `key` last fetched successfully.
    pub fn updated_at(&self, key: &QueryKey) -> Option<Instant> {
        self.entries.get(key).and_then(|e| e.updated_at)
    }

    pub fn services(&self, time_range: TimeRange) -> Query<'_, Vec<ServiceHealth>> {
        self.query(&QueryKey::Services(time_range), Payload::as_services)
    }

    pub fn service_metrics(
        &self,
        service: &str,
        time_range: TimeRange,
    ) -> Query<'_, ServiceMetricsDetail> {
        let key = QueryKey::ServiceMetrics {
            service: service.to_string(),
            time_range,
        };
        self.query(&key, Payload::as_service_metrics)
    }

    pub fn service_dependencies(&self, service: &str) -> Query<'_, ServiceDependencies> {
        let key = QueryKey::ServiceDependencies {
            service: service.to_string(),
        };
        self.query(&key, Payload::as_service_dependencies)
    }

    pub fn traces(&self, time_range: TimeRange) -> Query<'_, Vec<TraceInfo>> {
        self.query(&QueryKey::Traces(time_range), Payload::as_traces)
    }

    pub fn service_traces(&self, service: &str, time_range: TimeRange) -> Query<'_, Vec<TraceInfo>> {
        let key = QueryKey::ServiceTraces {
            service: service.to_string(),
            time_range,
        };
        self.query(&key, Payload::as_traces)
    }

    pub fn trace_detail(&self, trace_id: &str) -> Query<'_, TraceDetail> {
        let key = QueryKey::TraceDetail {
            trace_id: trace_id.to_string(),
        };
        self.query(&key, Payload::as_trace_detail)
    }

    pub fn dependency_graph(&self, time_range: TimeRange) -> Query<'_, DependencyGraph> {
        self.query(&QueryKey::DependencyGraph(time_range), Payload::as_dependency_graph)
    }

    fn query<T>(&self, key: &QueryKey, extract: fn(&Payload) -> Option<&T>) -> Query<'_, T> {
        match self.entries.get(key) {
            None => Query::idle(),
            Some(entry) => Query {
                data: entry.payload.as_ref().and_then(extract),
                error: entry.error.as_ref(),
                in_flight: entry.in_flight,
                updated_at: entry.updated_at,
            },
        }
    }

    fn start_fetch(&mut self, key: QueryKey) {
        self.next_generation += 1;
        let generation = self.next_generation;

        let entry = self.entries.entry(key.clone()).or_default();
        entry.in_flight = true;
        entry.generation = generation;

        debug!(?key, generation, "fetching query");
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = fetcher.fetch(&key).await;
            // The receiver lives as long as the cache; a send error means it is gone.
            let _ = tx.send(Completion {
                key,
                generation,
                result,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_services, settle, StubFetcher};
    use std::sync::atomic::Ordering;

    fn cache_with(fetcher: Arc<StubFetcher>, interval: Duration) -> QueryCache {
        QueryCache::new(fetcher, Handle::current(), interval)
    }

    #[tokio::test]
    async fn test_ensure_fetches_once_and_stores_payload() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(
            QueryKey::Services(TimeRange::OneHour),
            Ok(Payload::Services(sample_services())),
        );
        let mut cache = cache_with(fetcher.clone(), Duration::from_secs(3600));

        let key = QueryKey::Services(TimeRange::OneHour);
        cache.ensure(&key);
        assert!(cache.services(TimeRange::OneHour).is_loading());
        assert!(cache.services(TimeRange::OneHour).in_flight);

        settle(&mut cache).await;

        let query = cache.services(TimeRange::OneHour);
        assert_eq!(query.data.map(|s| s.len()), Some(sample_services().len()));
        assert!(query.error.is_none());
        assert!(!query.in_flight);

        // Fresh data is not fetched again before the interval elapses
        cache.ensure(&key);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auto_refresh_keys_refetch_after_interval() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(
            QueryKey::DependencyGraph(TimeRange::OneHour),
            Ok(Payload::DependencyGraph(DependencyGraph::default())),
        );
        let mut cache = cache_with(fetcher.clone(), Duration::ZERO);

        let key = QueryKey::DependencyGraph(TimeRange::OneHour);
        cache.ensure(&key);
        settle(&mut cache).await;
        cache.ensure(&key);
        settle(&mut cache).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_trace_keys_do_not_auto_refresh() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(QueryKey::Traces(TimeRange::OneHour), Ok(Payload::Traces(vec![])));
        let mut cache = cache_with(fetcher.clone(), Duration::ZERO);

        let key = QueryKey::Traces(TimeRange::OneHour);
        cache.ensure(&key);
        settle(&mut cache).await;
        cache.ensure(&key);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        // Explicit refetch still works
        cache.refetch(&key);
        settle(&mut cache).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_is_scoped_to_its_key_and_keeps_previous_data() {
        let fetcher = Arc::new(StubFetcher::new());
        let services = QueryKey::Services(TimeRange::OneHour);
        let graph = QueryKey::DependencyGraph(TimeRange::OneHour);
        fetcher.respond(services.clone(), Ok(Payload::Services(sample_services())));
        fetcher.respond(
            graph.clone(),
            Err(ApiError::Status {
                status: 500,
                body: "boom".into(),
            }),
        );
        let mut cache = cache_with(fetcher.clone(), Duration::from_secs(3600));

        cache.ensure(&services);
        cache.ensure(&graph);
        settle(&mut cache).await;

        assert!(cache.services(TimeRange::OneHour).error.is_none());
        let failed = cache.dependency_graph(TimeRange::OneHour);
        assert!(failed.data.is_none());
        assert!(matches!(failed.error, Some(ApiError::Status { status: 500, .. })));

        // A failed refetch keeps the last good data
        fetcher.respond(services.clone(), Err(ApiError::Transport("reset".into())));
        cache.refetch(&services);
        settle(&mut cache).await;
        let query = cache.services(TimeRange::OneHour);
        assert!(query.data.is_some());
        assert!(query.error.is_some());
    }

    #[tokio::test]
    async fn test_released_key_discards_late_result() {
        let fetcher = Arc::new(StubFetcher::gated());
        let key = QueryKey::TraceDetail {
            trace_id: "abc".into(),
        };
        fetcher.respond(key.clone(), Ok(Payload::Traces(vec![])));
        let mut cache = cache_with(fetcher.clone(), Duration::from_secs(3600));

        cache.ensure(&key);
        assert!(cache.release(&key));
        fetcher.open_gate();

        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(1)).await;
            cache.poll();
            if cache.discarded() > 0 {
                break;
            }
        }
        assert_eq!(cache.discarded(), 1);
        assert!(!cache.contains(&key));
        assert!(cache.trace_detail("abc").data.is_none());
    }

    #[tokio::test]
    async fn test_retain_releases_inactive_keys() {
        let fetcher = Arc::new(StubFetcher::new());
        let mut cache = cache_with(fetcher, Duration::from_secs(3600));
        cache.ensure(&QueryKey::Services(TimeRange::OneHour));
        cache.ensure(&QueryKey::Traces(TimeRange::OneHour));
        settle(&mut cache).await;

        cache.retain(|k| matches!(k, QueryKey::Services(_)));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&QueryKey::Services(TimeRange::OneHour)));
    }
}
