//! # servicewatch
//!
//! A terminal dashboard for service health, service dependencies and
//! distributed traces, backed by a metrics API.
//!
//! All metrics are computed server-side. The client fetches them over HTTP,
//! caches them per query, refreshes them on an interval and presents them in
//! an interactive terminal UI: a health dashboard, sortable services and
//! traces tables, detail overlays and a force-directed dependency map.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │  app    │───▶│  query   │───▶│   ui    │───▶│ Terminal │  │
//! │  │ (state) │    │ (cache)  │    │(render) │    │          │  │
//! │  └────┬────┘    └────┬─────┘    └────┬────┘    └──────────┘  │
//! │       │              │               │                       │
//! │       ▼              ▼               ▼                       │
//! │  ┌─────────┐    ┌─────────┐    ┌──────────┐                  │
//! │  │ context │    │   api   │    │  graph   │                  │
//! │  │(select) │    │ (HTTP)  │    │ (layout) │                  │
//! │  └─────────┘    └─────────┘    └──────────┘                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, view navigation, and user interaction logic
//! - **[`context`]**: Selected service, selected trace and global time range
//! - **[`query`]**: Keyed query cache with background fetches and interval refresh
//! - **[`api`]**: HTTP client for the metrics API
//! - **[`data`]**: API records, change indicators, time ranges and formatting
//! - **[`graph`]**: Edge validation, force-directed layout and the pan/zoom viewport
//! - **[`sort`]**: Client-side sorting shared by the tables
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch the API on localhost:8000
//! servicewatch
//!
//! # Another API, refreshing every 10 seconds, last 24 hours
//! servicewatch --api-url http://metrics.internal:8000 --refresh 10s --time-range 24h
//!
//! # Write the services list to a file and exit
//! servicewatch --export services.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use servicewatch::{ApiClient, App, QueryCache, Theme, TimeRange};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let client = ApiClient::new("http://localhost:8000", None, Duration::from_secs(10)).unwrap();
//! let queries = QueryCache::new(Arc::new(client), runtime.handle().clone(), Duration::from_secs(30));
//! let mut app = App::new(queries, TimeRange::OneHour, Theme::dark());
//! app.update();
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod events;
pub mod export;
pub mod graph;
pub mod logging;
pub mod query;
pub mod sort;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use api::ApiClient;
pub use app::{App, View};
pub use config::{Overrides, Settings};
pub use context::AppContext;
pub use data::{
    DependencyGraph, HealthStatus, ServiceHealth, ServiceMetricsDetail, TimeRange, TraceDetail,
    TraceInfo,
};
pub use error::ApiError;
pub use query::{Fetcher, QueryCache, QueryKey};
pub use ui::{Theme, ThemeChoice};
