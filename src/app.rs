//! Application state and navigation logic.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::info;

use crate::context::AppContext;
use crate::data::{HealthStatus, ServiceHealth, TimeRange, TraceInfo};
use crate::export;
use crate::query::{QueryCache, QueryKey};
use crate::sort::{sort_rows, SortState};
use crate::ui::dashboard::DashboardState;
use crate::ui::graph::GraphView;
use crate::ui::services::{ServiceColumn, ServicesState};
use crate::ui::traces::{TraceColumn, TracesState};
use crate::ui::Theme;

/// Default file written by the export key.
pub const EXPORT_FILE: &str = "servicewatch_export.json";

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
///
/// Service and trace details are overlays driven by the selection in
/// [`AppContext`], not separate views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Card grid of service health.
    Dashboard,
    /// Sortable table of services.
    Services,
    /// Force-directed dependency graph.
    Map,
    /// Sortable table of recent traces.
    Traces,
}

impl View {
    pub const ALL: [View; 4] = [View::Dashboard, View::Services, View::Map, View::Traces];

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Dashboard => View::Services,
            View::Services => View::Map,
            View::Map => View::Traces,
            View::Traces => View::Dashboard,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Dashboard => View::Traces,
            View::Services => View::Dashboard,
            View::Map => View::Services,
            View::Traces => View::Map,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Services => "Services",
            View::Map => "Map",
            View::Traces => "Traces",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            View::Dashboard => 0,
            View::Services => 1,
            View::Map => 2,
            View::Traces => 3,
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    /// Shared selection and global time range.
    pub context: AppContext,
    pub queries: QueryCache,

    // Per-view state
    pub dashboard: DashboardState,
    pub services: ServicesState,
    pub graph: GraphView,
    pub map_time_range: TimeRange,
    pub traces: TracesState,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,
    pub export_path: PathBuf,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from `queries`, starting on the Dashboard.
    pub fn new(queries: QueryCache, time_range: TimeRange, theme: Theme) -> Self {
        // View selectors only offer a subset of ranges
        let view_range = if TimeRange::SELECTOR.contains(&time_range) {
            time_range
        } else {
            TimeRange::default()
        };

        Self {
            running: true,
            current_view: View::Dashboard,
            show_help: false,
            context: AppContext::new(time_range),
            queries,
            dashboard: DashboardState::default(),
            services: ServicesState::new(view_range),
            graph: GraphView::default(),
            map_time_range: view_range,
            traces: TracesState::default(),
            filter_text: String::new(),
            filter_active: false,
            theme,
            export_path: PathBuf::from(EXPORT_FILE),
            status_message: None,
        }
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// One iteration of background work: apply finished fetches, register
    /// the queries the screen needs, release the rest, and advance the graph.
    pub fn update(&mut self) {
        self.queries.poll();
        self.sync_queries();
        self.sync_graph();
        self.graph.tick();
    }

    /// Whether the UI loop should wake up quickly (simulation running).
    pub fn is_animating(&self) -> bool {
        self.current_view == View::Map && self.graph.is_hot()
    }

    /// Query keys needed by the current screen.
    pub fn active_queries(&self) -> Vec<QueryKey> {
        let global = self.context.time_range();
        // The header always shows the global health counts
        let mut keys = vec![QueryKey::Services(global)];

        match self.current_view {
            View::Dashboard => {}
            View::Services => keys.push(QueryKey::Services(self.services.time_range)),
            View::Map => keys.push(QueryKey::DependencyGraph(self.map_time_range)),
            View::Traces => {
                keys.push(QueryKey::Traces(global));
                if let Some(ref service) = self.traces.service_filter {
                    keys.push(QueryKey::ServiceTraces {
                        service: service.clone(),
                        time_range: global,
                    });
                }
            }
        }

        if let Some(service) = self.context.selected_service() {
            keys.push(QueryKey::ServiceMetrics {
                service: service.to_string(),
                time_range: global,
            });
            keys.push(QueryKey::ServiceDependencies {
                service: service.to_string(),
            });
        }
        if let Some(trace_id) = self.context.selected_trace() {
            keys.push(QueryKey::TraceDetail {
                trace_id: trace_id.to_string(),
            });
        }
        keys
    }

    /// Register active keys and release everything else.
    pub fn sync_queries(&mut self) {
        let active = self.active_queries();
        for key in &active {
            self.queries.ensure(key);
        }
        self.queries.retain(|key| active.contains(key));
    }

    /// Mount the graph while the Map view shows data, unmount it otherwise.
    fn sync_graph(&mut self) {
        if self.current_view != View::Map {
            self.graph.unmount();
            return;
        }
        if let Some(data) = self.queries.dependency_graph(self.map_time_range).data {
            self.graph.mount(data);
        }
    }

    /// Query key whose freshness the status bar reports.
    pub fn primary_query(&self) -> QueryKey {
        let global = self.context.time_range();
        match self.current_view {
            View::Dashboard => QueryKey::Services(global),
            View::Services => QueryKey::Services(self.services.time_range),
            View::Map => QueryKey::DependencyGraph(self.map_time_range),
            View::Traces => match self.traces.service_filter {
                Some(ref service) => QueryKey::ServiceTraces {
                    service: service.clone(),
                    time_range: global,
                },
                None => QueryKey::Traces(global),
            },
        }
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        if self.current_view != view {
            self.current_view = view;
            self.filter_active = false;
        }
    }

    /// Services on the dashboard, in API order, filtered.
    pub fn dashboard_services(&self) -> Vec<&ServiceHealth> {
        self.queries
            .services(self.context.time_range())
            .data
            .map(|services| {
                services
                    .iter()
                    .filter(|s| self.matches_filter(&s.service_name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Services in the table, filtered and sorted.
    pub fn table_services(&self) -> Vec<&ServiceHealth> {
        let Some(services) = self.queries.services(self.services.time_range).data else {
            return Vec::new();
        };
        let mut rows: Vec<&ServiceHealth> = services
            .iter()
            .filter(|s| self.matches_filter(&s.service_name))
            .collect();
        sort_rows(&mut rows, &self.services.sort);
        rows
    }

    /// Traces in the table, filtered and sorted.
    pub fn table_traces(&self) -> Vec<&TraceInfo> {
        let global = self.context.time_range();
        let query = match self.traces.service_filter {
            Some(ref service) => self.queries.service_traces(service, global),
            None => self.queries.traces(global),
        };
        let Some(traces) = query.data else {
            return Vec::new();
        };
        let mut rows: Vec<&TraceInfo> = traces
            .iter()
            .filter(|t| {
                self.matches_filter(&t.trace_id)
                    || t.services_involved.iter().any(|s| self.matches_filter(s))
            })
            .collect();
        sort_rows(&mut rows, &self.traces.sort);
        rows
    }

    /// Sorted unique services found across all traces.
    pub fn trace_service_options(&self) -> Vec<String> {
        let Some(traces) = self.queries.traces(self.context.time_range()).data else {
            return Vec::new();
        };
        traces
            .iter()
            .flat_map(|t| t.services_involved.iter().cloned())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    }

    /// Cycle the traces service filter: all services, then each service.
    pub fn cycle_trace_filter(&mut self) {
        let options = self.trace_service_options();
        let next = match self.traces.service_filter {
            None => options.first().cloned(),
            Some(ref current) => options
                .iter()
                .position(|s| s == current)
                .and_then(|i| options.get(i + 1))
                .cloned(),
        };
        let label = next.clone().unwrap_or_else(|| "All Services".to_string());
        self.traces.service_filter = next;
        self.traces.selected = 0;
        self.set_status_message(format!("Traces: {}", label));
    }

    /// Number of rows/cards in the current view.
    fn item_count(&self) -> usize {
        match self.current_view {
            View::Dashboard => self.dashboard_services().len(),
            View::Services => self.table_services().len(),
            View::Traces => self.table_traces().len(),
            View::Map => self.graph.node_count(),
        }
    }

    fn selected_mut(&mut self) -> Option<&mut usize> {
        match self.current_view {
            View::Dashboard => Some(&mut self.dashboard.selected),
            View::Services => Some(&mut self.services.selected),
            View::Traces => Some(&mut self.traces.selected),
            View::Map => None,
        }
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.item_count().saturating_sub(1);
        if let Some(selected) = self.selected_mut() {
            *selected = (*selected + n).min(max);
        }
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        if let Some(selected) = self.selected_mut() {
            *selected = selected.saturating_sub(n);
        }
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        if let Some(selected) = self.selected_mut() {
            *selected = 0;
        }
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        let last = self.item_count().saturating_sub(1);
        if let Some(selected) = self.selected_mut() {
            *selected = last;
        }
    }

    /// Move the dashboard selection one row of cards up or down.
    pub fn select_dashboard_row(&mut self, down: bool) {
        let columns = self.dashboard.columns.max(1);
        if down {
            self.select_next_n(columns);
        } else {
            self.select_prev_n(columns);
        }
    }

    /// Open the detail overlay for the selected card, row or graph node.
    pub fn enter_detail(&mut self) {
        match self.current_view {
            View::Dashboard => {
                let name = self
                    .dashboard_services()
                    .get(self.dashboard.selected)
                    .map(|s| s.service_name.clone());
                if let Some(name) = name {
                    self.context.select_service(name);
                }
            }
            View::Services => {
                let name = self
                    .table_services()
                    .get(self.services.selected)
                    .map(|s| s.service_name.clone());
                if let Some(name) = name {
                    self.context.select_service(name);
                }
            }
            View::Traces => {
                let id = self
                    .table_traces()
                    .get(self.traces.selected)
                    .map(|t| t.trace_id.clone());
                if let Some(id) = id {
                    self.context.select_trace(id);
                }
            }
            View::Map => {
                if let Some(id) = self.graph.focused_id() {
                    let id = id.to_string();
                    self.context.select_service(id);
                }
            }
        }
    }

    /// Whether a detail overlay is open.
    pub fn overlay_open(&self) -> bool {
        self.context.selected_service().is_some() || self.context.selected_trace().is_some()
    }

    /// Navigate back: close overlay first, then return to the Dashboard.
    pub fn go_back(&mut self) {
        if self.context.clear_selection() {
            return;
        }
        self.set_view(View::Dashboard);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Cycle the time range that applies to the current view.
    ///
    /// Services and Map have their own `1h`/`24h` selector; everything else
    /// (including detail overlays) uses the global range.
    pub fn cycle_time_range(&mut self) {
        let range = if self.overlay_open() {
            self.context.cycle_time_range()
        } else {
            match self.current_view {
                View::Services => {
                    self.services.time_range = self.services.time_range.next_in(&TimeRange::SELECTOR);
                    self.services.selected = 0;
                    self.services.time_range
                }
                View::Map => {
                    self.map_time_range = self.map_time_range.next_in(&TimeRange::SELECTOR);
                    self.map_time_range
                }
                View::Dashboard | View::Traces => {
                    self.dashboard.selected = 0;
                    self.traces.selected = 0;
                    self.context.cycle_time_range()
                }
            }
        };
        self.set_status_message(format!("Time range: {}", range.label()));
    }

    /// Cycle to the next sort column for the current view.
    pub fn cycle_sort(&mut self) {
        match self.current_view {
            View::Services => {
                let next = self.services.sort.column.next();
                self.services.sort.select(next);
            }
            View::Traces => {
                let next = self.traces.sort.column.next();
                self.traces.sort.select(next);
            }
            _ => {}
        }
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        match self.current_view {
            View::Services => self.services.sort.toggle(),
            View::Traces => self.traces.sort.toggle(),
            _ => {}
        }
    }

    pub fn sort_services_by(&mut self, column: ServiceColumn) {
        self.services.sort.select(column);
    }

    pub fn sort_traces_by(&mut self, column: TraceColumn) {
        self.traces.sort.select(column);
    }

    /// Refetch every active query now.
    pub fn reload(&mut self) {
        self.queries.refetch_all();
        self.set_status_message("Reloading...".to_string());
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.reset_selection();
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
        self.reset_selection();
    }

    fn reset_selection(&mut self) {
        self.dashboard.selected = 0;
        self.services.selected = 0;
        self.traces.selected = 0;
    }

    /// Check if a name matches the current filter.
    pub fn matches_filter(&self, name: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        name.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    /// Health counts for the header, from the global services list.
    pub fn health_counts(&self) -> Option<HealthCounts> {
        self.queries
            .services(self.context.time_range())
            .data
            .map(|services| HealthCounts::from_services(services))
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the cached global services list to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let time_range = self.context.time_range();
        let Some(services) = self.queries.services(time_range).data else {
            anyhow::bail!("No data to export");
        };
        export::write_export(path, services, time_range)?;
        info!(path = %path.display(), services = services.len(), "exported services");
        Ok(())
    }
}

/// Number of services per health status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthCounts {
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
}

impl HealthCounts {
    pub fn from_services(services: &[ServiceHealth]) -> Self {
        let mut counts = Self::default();
        for service in services {
            match service.health_status {
                HealthStatus::Healthy => counts.healthy += 1,
                HealthStatus::Warning => counts.warning += 1,
                HealthStatus::Critical => counts.critical += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.healthy + self.warning + self.critical
    }

    /// Worst status present, healthy when empty.
    pub fn overall(&self) -> HealthStatus {
        if self.critical > 0 {
            HealthStatus::Critical
        } else if self.warning > 0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DependencyGraph;
    use crate::query::Payload;
    use crate::test_support::{
        sample_graph, sample_services, sample_traces, settle_app, test_app, StubFetcher,
    };
    use std::sync::Arc;

    fn app_with(fetcher: StubFetcher) -> (App, Arc<StubFetcher>) {
        let fetcher = Arc::new(fetcher);
        (test_app(fetcher.clone()), fetcher)
    }

    fn loaded_fetcher() -> StubFetcher {
        let fetcher = StubFetcher::new();
        for range in TimeRange::ALL {
            fetcher.respond(QueryKey::Services(range), Ok(Payload::Services(sample_services())));
            fetcher.respond(QueryKey::Traces(range), Ok(Payload::Traces(sample_traces())));
            fetcher.respond(
                QueryKey::DependencyGraph(range),
                Ok(Payload::DependencyGraph(sample_graph())),
            );
        }
        fetcher
    }

    #[test]
    fn test_view_cycle() {
        let mut view = View::Dashboard;
        for _ in 0..View::ALL.len() {
            assert_eq!(view.next().prev(), view);
            view = view.next();
        }
        assert_eq!(view, View::Dashboard);
    }

    #[test]
    fn test_health_counts() {
        let counts = HealthCounts::from_services(&sample_services());
        assert_eq!(counts.total(), sample_services().len());
        assert_eq!(counts.overall(), HealthStatus::Critical);
        assert_eq!(HealthCounts::default().overall(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_active_queries_follow_view_and_selection() {
        let (mut app, _) = app_with(loaded_fetcher());
        assert_eq!(app.active_queries(), vec![QueryKey::Services(TimeRange::OneHour)]);

        app.set_view(View::Map);
        assert!(app
            .active_queries()
            .contains(&QueryKey::DependencyGraph(TimeRange::OneHour)));

        app.context.select_service("checkout");
        let keys = app.active_queries();
        assert!(keys.contains(&QueryKey::ServiceDependencies {
            service: "checkout".into()
        }));
        assert!(keys.contains(&QueryKey::ServiceMetrics {
            service: "checkout".into(),
            time_range: TimeRange::OneHour
        }));
    }

    #[tokio::test]
    async fn test_switching_views_releases_queries() {
        let (mut app, _) = app_with(loaded_fetcher());
        app.set_view(View::Map);
        settle_app(&mut app).await;
        assert!(app.graph.is_mounted());
        assert!(app
            .queries
            .contains(&QueryKey::DependencyGraph(TimeRange::OneHour)));

        app.set_view(View::Traces);
        app.update();
        assert!(!app.graph.is_mounted());
        assert!(!app
            .queries
            .contains(&QueryKey::DependencyGraph(TimeRange::OneHour)));
        assert!(app.queries.contains(&QueryKey::Traces(TimeRange::OneHour)));
    }

    #[tokio::test]
    async fn test_enter_on_services_row_selects_sorted_row() {
        let (mut app, _) = app_with(loaded_fetcher());
        app.set_view(View::Services);
        settle_app(&mut app).await;

        // Sort by status descending: critical first
        app.sort_services_by(ServiceColumn::Status);
        app.toggle_sort_direction();
        app.select_first();
        app.enter_detail();
        assert_eq!(app.context.selected_service(), Some("payments"));

        app.go_back();
        assert!(!app.overlay_open());
        app.go_back();
        assert_eq!(app.current_view, View::Dashboard);
    }

    #[tokio::test]
    async fn test_view_time_range_uses_selector_subset() {
        let (mut app, _) = app_with(loaded_fetcher());
        app.set_view(View::Services);
        app.cycle_time_range();
        assert_eq!(app.services.time_range, TimeRange::TwentyFourHours);
        app.cycle_time_range();
        assert_eq!(app.services.time_range, TimeRange::OneHour);
        assert_eq!(app.context.time_range(), TimeRange::OneHour);

        app.set_view(View::Dashboard);
        app.cycle_time_range();
        assert_eq!(app.context.time_range(), TimeRange::TwentyFourHours);
    }

    #[tokio::test]
    async fn test_trace_filter_cycles_through_services() {
        let (mut app, _) = app_with(loaded_fetcher());
        app.set_view(View::Traces);
        settle_app(&mut app).await;

        let options = app.trace_service_options();
        assert_eq!(options, vec!["checkout", "frontend", "payments"]);

        app.cycle_trace_filter();
        assert_eq!(app.traces.service_filter.as_deref(), Some("checkout"));
        assert!(app.active_queries().contains(&QueryKey::ServiceTraces {
            service: "checkout".into(),
            time_range: TimeRange::OneHour
        }));
        app.cycle_trace_filter();
        app.cycle_trace_filter();
        assert_eq!(app.traces.service_filter.as_deref(), Some("payments"));
        app.cycle_trace_filter();
        assert_eq!(app.traces.service_filter, None);
    }

    #[tokio::test]
    async fn test_text_filter_narrows_rows() {
        let (mut app, _) = app_with(loaded_fetcher());
        app.set_view(View::Services);
        settle_app(&mut app).await;

        for c in "PAY".chars() {
            app.filter_push(c);
        }
        let names: Vec<&str> = app
            .table_services()
            .iter()
            .map(|s| s.service_name.as_str())
            .collect();
        assert_eq!(names, vec!["payments"]);
    }

    #[tokio::test]
    async fn test_graph_node_selection_opens_overlay() {
        let (mut app, _) = app_with(loaded_fetcher());
        app.set_view(View::Map);
        settle_app(&mut app).await;

        app.graph.focus_next();
        let focused = app.graph.focused_id().map(str::to_string);
        app.enter_detail();
        assert_eq!(app.context.selected_service(), focused.as_deref());
    }

    #[tokio::test]
    async fn test_export_writes_services() {
        let (mut app, _) = app_with(loaded_fetcher());
        settle_app(&mut app).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        app.export_state(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["summary"]["total_services"], sample_services().len());
        assert_eq!(written["time_range"], "1h");
    }

    #[tokio::test]
    async fn test_export_without_data_fails() {
        let (app, _) = app_with(StubFetcher::new());
        let dir = tempfile::tempdir().unwrap();
        assert!(app.export_state(&dir.path().join("x.json")).is_err());
    }

    #[tokio::test]
    async fn test_empty_graph_mounts_without_nodes() {
        let fetcher = StubFetcher::new();
        fetcher.respond(
            QueryKey::DependencyGraph(TimeRange::OneHour),
            Ok(Payload::DependencyGraph(DependencyGraph::default())),
        );
        let (mut app, _) = app_with(fetcher);
        app.set_view(View::Map);
        settle_app(&mut app).await;
        assert!(app.graph.is_mounted());
        assert_eq!(app.graph.node_count(), 0);
    }
}
