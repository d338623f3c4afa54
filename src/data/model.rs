//! Display-oriented records returned by the metrics API.
//!
//! Everything here is computed server-side and only deserialized, shown and
//! discarded by the client. Field names follow the wire format.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health classification assigned to a service by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "CRIT",
        }
    }

    /// Returns the wire name (also used as the badge text).
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        }
    }

    /// Numeric severity, healthy being the lowest.
    pub fn severity(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Warning => 1,
            HealthStatus::Critical => 2,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "healthy" => Ok(HealthStatus::Healthy),
            "warning" => Ok(HealthStatus::Warning),
            "critical" => Ok(HealthStatus::Critical),
            other => Err(format!("unknown health status '{}'", other)),
        }
    }
}

/// Point-in-time metrics for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub latency_p50: f64,
    pub latency_p95: f64,
    pub latency_p99: f64,
    pub avg_duration_ms: f64,
    pub max_duration_ms: f64,
    pub error_count: u64,
    /// Fraction of failed requests (0.0..=1.0).
    pub error_rate: f64,
    pub request_count: u64,
    pub requests_per_second: f64,
}

/// One row of the services list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub service_name: String,
    pub health_status: HealthStatus,
    pub current_latency_p50: f64,
    pub current_latency_p95: f64,
    pub current_latency_p99: f64,
    pub avg_duration_ms: f64,
    pub max_duration_ms: f64,
    pub error_count: u64,
    pub error_rate: f64,
    pub request_count: u64,
    pub requests_per_second: f64,
}

/// A bucket of the trailing time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsTimeSeries {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub latency_p95: f64,
    pub avg_duration_ms: f64,
    pub error_count: u64,
    pub request_count: u64,
}

/// Extended metrics for the service detail panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetricsDetail {
    pub service_name: String,
    pub current: MetricsSnapshot,
    pub trends: Vec<MetricsTimeSeries>,
    pub baseline: MetricsSnapshot,
}

/// A direct caller or callee of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub service_name: String,
    pub call_count: u64,
    /// Free-form on the wire; see [`DependencyInfo::health`].
    pub health_status: String,
}

impl DependencyInfo {
    /// Parsed health, `None` for values outside the known classification.
    pub fn health(&self) -> Option<HealthStatus> {
        self.health_status.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDependencies {
    pub service_name: String,
    pub inbound: Vec<DependencyInfo>,
    pub outbound: Vec<DependencyInfo>,
}

impl ServiceDependencies {
    pub fn is_empty(&self) -> bool {
        self.inbound.is_empty() && self.outbound.is_empty()
    }
}

/// A service in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub health: HealthStatus,
    #[serde(rename = "errorRate")]
    pub error_rate: f64,
    #[serde(rename = "requestCount")]
    pub request_count: u64,
}

/// A directed, weighted call relationship between two services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "callCount")]
    pub call_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Summary row of the traces table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceInfo {
    pub trace_id: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub trace_start: DateTime<Utc>,
    pub services_involved: Vec<String>,
    pub total_duration_ms: f64,
    pub span_count: u64,
}

/// One service's contribution to a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanDetail {
    pub service_name: String,
    pub total_duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceDetail {
    pub trace_id: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub trace_start: DateTime<Utc>,
    pub spans: Vec<SpanDetail>,
}

/// Lenient timestamp parsing.
///
/// The API emits RFC 3339 timestamps, but naive ones (no offset) also occur
/// and are taken as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}
