//! Query keys and the payloads they resolve to.

use crate::data::{
    DependencyGraph, ServiceDependencies, ServiceHealth, ServiceMetricsDetail, TimeRange,
    TraceDetail, TraceInfo,
};

/// Identifies one cached query: the endpoint plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// `/api/services/list`
    Services(TimeRange),
    /// `/api/services/{name}/metrics`
    ServiceMetrics {
        service: String,
        time_range: TimeRange,
    },
    /// `/api/services/{name}/dependencies`
    ServiceDependencies { service: String },
    /// `/api/services/{name}/traces`
    ServiceTraces {
        service: String,
        time_range: TimeRange,
    },
    /// `/api/services/traces/{traceId}`
    TraceDetail { trace_id: String },
    /// `/api/dependencies/graph`
    DependencyGraph(TimeRange),
    /// `/api/traces`
    Traces(TimeRange),
}

impl QueryKey {
    /// Whether this query refetches automatically on the refresh interval.
    ///
    /// Health and metrics views poll; trace queries are fetched once and
    /// only refreshed on an explicit reload.
    pub fn auto_refresh(&self) -> bool {
        match self {
            QueryKey::Services(_)
            | QueryKey::ServiceMetrics { .. }
            | QueryKey::ServiceDependencies { .. }
            | QueryKey::DependencyGraph(_) => true,
            QueryKey::ServiceTraces { .. } | QueryKey::TraceDetail { .. } | QueryKey::Traces(_) => {
                false
            }
        }
    }

    /// Short name of what is being loaded, for messages.
    pub fn subject(&self) -> &'static str {
        match self {
            QueryKey::Services(_) => "services",
            QueryKey::ServiceMetrics { .. } => "metrics",
            QueryKey::ServiceDependencies { .. } => "dependencies",
            QueryKey::ServiceTraces { .. } | QueryKey::Traces(_) => "traces",
            QueryKey::TraceDetail { .. } => "trace",
            QueryKey::DependencyGraph(_) => "dependency graph",
        }
    }
}

/// A successfully fetched response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Services(Vec<ServiceHealth>),
    ServiceMetrics(ServiceMetricsDetail),
    ServiceDependencies(ServiceDependencies),
    Traces(Vec<TraceInfo>),
    TraceDetail(TraceDetail),
    DependencyGraph(DependencyGraph),
}

impl Payload {
    pub fn as_services(&self) -> Option<&Vec<ServiceHealth>> {
        match self {
            Payload::Services(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_service_metrics(&self) -> Option<&ServiceMetricsDetail> {
        match self {
            Payload::ServiceMetrics(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_service_dependencies(&self) -> Option<&ServiceDependencies> {
        match self {
            Payload::ServiceDependencies(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_traces(&self) -> Option<&Vec<TraceInfo>> {
        match self {
            Payload::Traces(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_trace_detail(&self) -> Option<&TraceDetail> {
        match self {
            Payload::TraceDetail(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dependency_graph(&self) -> Option<&DependencyGraph> {
        match self {
            Payload::DependencyGraph(v) => Some(v),
            _ => None,
        }
    }
}
