//! Cached, background-refreshed queries against the metrics API.
//!
//! The UI never awaits a request. It registers the keys it needs each frame
//! with [`QueryCache::ensure`], reads whatever is cached, and lets
//! [`QueryCache::poll`] fold finished fetches in between frames.

mod cache;
mod key;

pub use cache::{Query, QueryCache};
pub use key::{Payload, QueryKey};

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::error::ApiError;

/// Resolves a [`QueryKey`] to its payload.
///
/// Implemented by [`ApiClient`]; tests substitute canned responses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, key: &QueryKey) -> Result<Payload, ApiError>;
}

#[async_trait]
impl Fetcher for ApiClient {
    async fn fetch(&self, key: &QueryKey) -> Result<Payload, ApiError> {
        match key {
            QueryKey::Services(range) => self.services(*range).await.map(Payload::Services),
            QueryKey::ServiceMetrics {
                service,
                time_range,
            } => self
                .service_metrics(service, *time_range)
                .await
                .map(Payload::ServiceMetrics),
            QueryKey::ServiceDependencies { service } => self
                .service_dependencies(service)
                .await
                .map(Payload::ServiceDependencies),
            QueryKey::ServiceTraces {
                service,
                time_range,
            } => self
                .service_traces(service, *time_range)
                .await
                .map(Payload::Traces),
            QueryKey::TraceDetail { trace_id } => {
                self.trace_detail(trace_id).await.map(Payload::TraceDetail)
            }
            QueryKey::DependencyGraph(range) => self
                .dependency_graph(*range)
                .await
                .map(Payload::DependencyGraph),
            QueryKey::Traces(range) => self.traces(*range).await.map(Payload::Traces),
        }
    }
}
