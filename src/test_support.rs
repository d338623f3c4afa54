//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use ratatui::buffer::Buffer;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use crate::app::App;
use crate::data::{
    DependencyGraph, GraphEdge, GraphNode, HealthStatus, MetricsSnapshot, MetricsTimeSeries,
    ServiceHealth, ServiceMetricsDetail, TimeRange, TraceInfo,
};
use crate::error::ApiError;
use crate::query::{Fetcher, Payload, QueryCache, QueryKey};
use crate::ui::Theme;

/// Upper bound on polling rounds while waiting for fetches.
const SETTLE_ROUNDS: usize = 500;

/// Fetcher answering from canned responses.
///
/// Unknown keys fail with a transport error. A gated stub holds every
/// request until [`StubFetcher::open_gate`] is called.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<QueryKey, Result<Payload, ApiError>>>,
    gate: Option<Semaphore>,
    pub calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn respond(&self, key: QueryKey, result: Result<Payload, ApiError>) {
        self.responses.lock().unwrap().insert(key, result);
    }

    /// Release held requests and let all later ones through.
    pub fn open_gate(&self) {
        if let Some(ref gate) = self.gate {
            gate.close();
        }
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, key: &QueryKey) -> Result<Payload, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref gate) = self.gate {
            // Acquire only fails once the gate is closed, i.e. open
            let _ = gate.acquire().await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::Transport(format!("no stub for {:?}", key))))
    }
}

/// Poll `cache` until no fetch is in flight.
pub async fn settle(cache: &mut QueryCache) {
    for _ in 0..SETTLE_ROUNDS {
        tokio::time::sleep(Duration::from_millis(1)).await;
        cache.poll();
        if cache.in_flight() == 0 {
            return;
        }
    }
    panic!("queries did not settle");
}

/// App on the 1h range with a cache that never auto-refreshes during a test.
pub fn test_app(fetcher: Arc<StubFetcher>) -> App {
    let queries = QueryCache::new(fetcher, Handle::current(), Duration::from_secs(3600));
    App::new(queries, TimeRange::OneHour, Theme::dark())
}

/// Run app updates until the queries the current screen needs have landed.
pub async fn settle_app(app: &mut App) {
    app.update();
    for _ in 0..SETTLE_ROUNDS {
        tokio::time::sleep(Duration::from_millis(1)).await;
        app.update();
        if app.queries.in_flight() == 0 {
            return;
        }
    }
    panic!("app queries did not settle");
}

fn service(name: &str, status: HealthStatus, p50: f64, error_rate: f64, requests: u64) -> ServiceHealth {
    ServiceHealth {
        service_name: name.to_string(),
        health_status: status,
        current_latency_p50: p50,
        current_latency_p95: p50 * 3.0,
        current_latency_p99: p50 * 5.0,
        avg_duration_ms: p50 * 1.2,
        max_duration_ms: p50 * 10.0,
        error_count: (requests as f64 * error_rate).round() as u64,
        error_rate,
        request_count: requests,
        requests_per_second: requests as f64 / 3600.0,
    }
}

/// Four services, exactly one of them critical.
pub fn sample_services() -> Vec<ServiceHealth> {
    vec![
        service("frontend", HealthStatus::Healthy, 12.0, 0.001, 12_000),
        service("checkout", HealthStatus::Warning, 45.5, 0.02, 4_200),
        service("payments", HealthStatus::Critical, 310.0, 0.12, 900),
        service("inventory", HealthStatus::Healthy, 8.25, 0.0, 4_200),
    ]
}

fn trace(id: &str, minute: u32, services: &[&str], duration: f64, spans: u64) -> TraceInfo {
    TraceInfo {
        trace_id: id.to_string(),
        trace_start: Utc
            .with_ymd_and_hms(2024, 5, 1, 10, minute, 0)
            .single()
            .unwrap(),
        services_involved: services.iter().map(|s| s.to_string()).collect(),
        total_duration_ms: duration,
        span_count: spans,
    }
}

pub fn sample_traces() -> Vec<TraceInfo> {
    vec![
        trace("t-1", 5, &["frontend", "checkout"], 120.0, 6),
        trace("t-2", 12, &["frontend", "checkout", "payments"], 840.5, 14),
        trace("t-3", 1, &["frontend"], 9.0, 2),
        trace("t-4", 30, &["checkout", "payments"], 120.0, 5),
    ]
}

fn node(id: &str, health: HealthStatus) -> GraphNode {
    GraphNode {
        id: id.to_string(),
        health,
        error_rate: 0.0,
        request_count: 100,
    }
}

fn edge(source: &str, target: &str, call_count: u64) -> GraphEdge {
    GraphEdge {
        source: source.to_string(),
        target: target.to_string(),
        call_count,
    }
}

pub fn sample_graph() -> DependencyGraph {
    DependencyGraph {
        nodes: vec![
            node("frontend", HealthStatus::Healthy),
            node("checkout", HealthStatus::Warning),
            node("payments", HealthStatus::Critical),
            node("inventory", HealthStatus::Healthy),
        ],
        edges: vec![
            edge("frontend", "checkout", 400),
            edge("checkout", "payments", 120),
            edge("checkout", "inventory", 90),
        ],
    }
}

fn snapshot(p50: f64, p95: f64) -> MetricsSnapshot {
    MetricsSnapshot {
        latency_p50: p50,
        latency_p95: p95,
        latency_p99: 100.0,
        avg_duration_ms: 100.0,
        max_duration_ms: 400.0,
        error_count: 2,
        error_rate: 0.01,
        request_count: 200,
        requests_per_second: 1.0,
    }
}

/// Metrics for `checkout`: p50 barely moved, p95 is up 2% on baseline.
pub fn sample_metrics() -> ServiceMetricsDetail {
    let trends = (0..6)
        .map(|i| MetricsTimeSeries {
            timestamp: Utc
                .with_ymd_and_hms(2024, 5, 1, 10, i * 10, 0)
                .single()
                .unwrap(),
            latency_p95: 95.0 + f64::from(i),
            avg_duration_ms: 90.0 + f64::from(i),
            error_count: u64::from(i % 2),
            request_count: 30 + u64::from(i),
        })
        .collect();

    ServiceMetricsDetail {
        service_name: "checkout".to_string(),
        current: snapshot(100.9, 102.0),
        trends,
        baseline: snapshot(100.0, 100.0),
    }
}

/// Buffer contents as text, one line per row.
pub fn buffer_text(buffer: &Buffer) -> String {
    let width = usize::from(buffer.area.width.max(1));
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
