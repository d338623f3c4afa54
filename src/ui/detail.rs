//! Detail overlay rendering.
//!
//! Displays a modal overlay for the selected service (metrics versus
//! baseline, trends, dependencies) or the selected trace (per-service
//! duration breakdown).

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Sparkline, Table},
    Frame,
};

use crate::app::App;
use crate::data::format::{format_ms, format_thousands, truncate};
use crate::data::{
    DetailMetric, DependencyInfo, MetricsTimeSeries, ServiceDependencies, ServiceMetricsDetail,
    TraceDetail,
};
use crate::ui::Theme;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;
/// Width of the duration bars in the trace breakdown.
const BAR_WIDTH: usize = 30;

/// Render the overlay for whatever is selected, if anything.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    if let Some(service) = app.context.selected_service() {
        let overlay = overlay_area(area);
        frame.render_widget(Clear, overlay);
        render_service(frame, app, service, overlay);
    } else if let Some(trace_id) = app.context.selected_trace() {
        let overlay = overlay_area(area);
        frame.render_widget(Clear, overlay);
        render_trace(frame, app, trace_id, overlay);
    }
}

fn overlay_area(area: Rect) -> Rect {
    // Width: 95% of screen, clamped to [MIN_OVERLAY_WIDTH, 120]
    let width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 120);
    // Height: 90% of screen, clamped to [MIN_OVERLAY_HEIGHT, 50]
    let height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 50);
    super::common::centered(area, width, height)
}

fn overlay_block<'a>(theme: &Theme, title: String) -> Block<'a> {
    Block::default()
        .title(title)
        .title_bottom(Line::from(" Esc:close t:range ").right_aligned())
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.highlight))
}

fn render_service(frame: &mut Frame, app: &App, service: &str, area: Rect) {
    let time_range = app.context.time_range();
    let block = overlay_block(
        &app.theme,
        format!(" {} [{}] ", service, time_range.label()),
    );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let metrics = app.queries.service_metrics(service, time_range);
    let dependencies = app.queries.service_dependencies(service);
    let show_deps = dependencies.data.is_some_and(|d| !d.is_empty());

    let chunks = Layout::vertical([
        Constraint::Length(4),                                   // Metric cards
        Constraint::Min(6),                                      // Trends
        Constraint::Length(if show_deps { 8 } else { 0 }),       // Dependencies
    ])
    .split(inner);

    match metrics.data {
        Some(detail) => {
            render_metric_cards(frame, &app.theme, detail, chunks[0]);
            render_trends(frame, &app.theme, &detail.trends, chunks[1]);
        }
        None => {
            let area = Rect {
                height: chunks[0].height + chunks[1].height,
                ..chunks[0]
            };
            super::common::render_query_state(frame, app, area, " Metrics ", "metrics", &metrics);
        }
    }

    if let Some(deps) = dependencies.data.filter(|_| show_deps) {
        render_dependencies(frame, &app.theme, deps, chunks[2]);
    }
}

fn render_metric_cards(frame: &mut Frame, theme: &Theme, detail: &ServiceMetricsDetail, area: Rect) {
    let constraints = DetailMetric::ALL.map(|_| Constraint::Ratio(1, DetailMetric::ALL.len() as u32));
    let cells = Layout::horizontal(constraints).split(area);

    for (metric, cell) in DetailMetric::ALL.iter().zip(cells.iter()) {
        let value = metric.value(&detail.current);
        let change = metric.change(&detail.current, &detail.baseline);
        let lines = vec![
            Line::from(Span::styled(
                metric.format(value),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled(change.text, theme.change_style(change.tone)),
                Span::styled(" vs baseline", theme.muted),
            ]),
        ];
        let block = Block::default()
            .title(format!(" {} ", metric.label()))
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.border));
        frame.render_widget(Paragraph::new(lines).block(block), *cell);
    }
}

/// Sparkline data for one trend series.
fn series(trends: &[MetricsTimeSeries], value: impl Fn(&MetricsTimeSeries) -> f64) -> Vec<u64> {
    // Sparklines take integers; keep two decimals of precision
    trends
        .iter()
        .map(|t| (value(t).max(0.0) * 100.0).round() as u64)
        .collect()
}

fn render_trends(frame: &mut Frame, theme: &Theme, trends: &[MetricsTimeSeries], area: Rect) {
    let block = Block::default()
        .title(format!(" Trends ({} points) ", trends.len()))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if trends.is_empty() {
        frame.render_widget(Paragraph::new("No trend data").style(theme.muted), inner);
        return;
    }

    let last = trends.last();
    let panels: [(&str, Vec<u64>, String); 4] = [
        (
            "P95 latency",
            series(trends, |t| t.latency_p95),
            last.map(|t| format_ms(t.latency_p95)).unwrap_or_default(),
        ),
        (
            "Avg duration",
            series(trends, |t| t.avg_duration_ms),
            last.map(|t| format_ms(t.avg_duration_ms)).unwrap_or_default(),
        ),
        (
            "Errors",
            series(trends, |t| t.error_count as f64),
            last.map(|t| format_thousands(t.error_count)).unwrap_or_default(),
        ),
        (
            "Requests",
            series(trends, |t| t.request_count as f64),
            last.map(|t| format_thousands(t.request_count)).unwrap_or_default(),
        ),
    ];

    let rows = Layout::vertical([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).split(inner);
    for (i, (label, data, latest)) in panels.iter().enumerate() {
        let columns =
            Layout::horizontal([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).split(rows[i / 2]);
        let sparkline = Sparkline::default()
            .block(
                Block::default()
                    .title(format!(" {} {} ", label, latest))
                    .title_style(theme.muted),
            )
            .data(data)
            .style(Style::default().fg(theme.highlight));
        frame.render_widget(sparkline, columns[i % 2]);
    }
}

fn render_dependencies(frame: &mut Frame, theme: &Theme, deps: &ServiceDependencies, area: Rect) {
    let halves = Layout::horizontal([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).split(area);
    render_dependency_list(frame, theme, " Inbound (callers) ", &deps.inbound, halves[0]);
    render_dependency_list(frame, theme, " Outbound (callees) ", &deps.outbound, halves[1]);
}

fn render_dependency_list(
    frame: &mut Frame,
    theme: &Theme,
    title: &str,
    list: &[DependencyInfo],
    area: Rect,
) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));

    if list.is_empty() {
        frame.render_widget(Paragraph::new(" none").style(theme.muted).block(block), area);
        return;
    }

    let rows: Vec<Row> = list
        .iter()
        .map(|d| {
            let badge = match d.health() {
                Some(status) => status.symbol().to_string(),
                None => d.health_status.clone(),
            };
            Row::new(vec![
                Cell::from(d.service_name.clone()),
                Cell::from(badge).style(theme.health_text_style(d.health())),
                Cell::from(format!("{} calls", format_thousands(d.call_count))),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Fill(2), Constraint::Length(8), Constraint::Fill(1)],
    )
    .block(block);
    frame.render_widget(table, area);
}

fn render_trace(frame: &mut Frame, app: &App, trace_id: &str, area: Rect) {
    let block = overlay_block(&app.theme, format!(" Trace {} ", truncate(trace_id, 40)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let query = app.queries.trace_detail(trace_id);
    let Some(detail) = query.data else {
        super::common::render_query_state(frame, app, inner, " Trace ", "trace", &query);
        return;
    };

    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).split(inner);
    frame.render_widget(Paragraph::new(trace_summary(&app.theme, detail)), chunks[0]);

    let max = detail
        .spans
        .iter()
        .map(|s| s.total_duration_ms)
        .fold(0.0_f64, f64::max);
    let rows: Vec<Row> = detail
        .spans
        .iter()
        .map(|span| {
            let filled = if max > 0.0 {
                ((span.total_duration_ms / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            Row::new(vec![
                Cell::from(span.service_name.clone()),
                Cell::from(format_ms(span.total_duration_ms)),
                Cell::from("█".repeat(filled.max(1))).style(Style::default().fg(app.theme.highlight)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Fill(2),
            Constraint::Length(14),
            Constraint::Length(BAR_WIDTH as u16),
        ],
    )
    .header(Row::new(vec!["Service", "Duration", "Breakdown"]).style(app.theme.header))
    .block(
        Block::default()
            .title(" Service breakdown ")
            .borders(Borders::TOP)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(table, chunks[1]);
}

fn trace_summary<'a>(theme: &Theme, detail: &TraceDetail) -> Vec<Line<'a>> {
    let total: f64 = detail.spans.iter().map(|s| s.total_duration_ms).sum();
    vec![
        Line::from(vec![
            Span::styled(" Started ", theme.muted),
            Span::raw(detail.trace_start.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]),
        Line::from(vec![
            Span::styled(" Services ", theme.muted),
            Span::raw(detail.spans.len().to_string()),
            Span::styled("   Total ", theme.muted),
            Span::raw(format_ms(total)),
        ]),
    ]
}
