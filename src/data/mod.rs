//! Data models and the small amount of client-side processing on them.
//!
//! All metrics arrive precomputed from the API; this module only holds the
//! wire records and the helpers the views need to present them.
//!
//! ## Submodules
//!
//! - [`model`]: API records ([`ServiceHealth`], [`DependencyGraph`], [`TraceInfo`], ...)
//! - [`change`]: Baseline-relative change indicators with per-metric direction
//! - [`time_range`]: The `15m` / `1h` / `24h` query window
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "30s", "500ms")
//! - [`format`]: Number formatting shared by the views
//!
//! ## Data Flow
//!
//! ```text
//! API JSON
//!    │
//!    ▼
//! QueryCache (keyed by endpoint + parameters)
//!    │
//!    ├──▶ tables sorted client-side (crate::sort)
//!    ├──▶ graph validated and laid out (crate::graph)
//!    └──▶ detail panels with change indicators (change)
//! ```

pub mod change;
pub mod duration;
pub mod format;
pub mod model;
pub mod time_range;

pub use change::{ChangeIndicator, ChangeTone, DetailMetric, MetricDirection};
pub use model::{
    DependencyGraph, DependencyInfo, GraphEdge, GraphNode, HealthStatus, MetricsSnapshot,
    MetricsTimeSeries, ServiceDependencies, ServiceHealth, ServiceMetricsDetail, SpanDetail,
    TraceDetail, TraceInfo,
};
pub use time_range::TimeRange;
