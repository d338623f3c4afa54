//! Services view rendering.
//!
//! Sortable table of every service with latency percentiles, error rate and
//! throughput for the view's own time range.

use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, HighlightSpacing, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::format::{format_ms, format_rate, format_thousands};
use crate::data::{ServiceHealth, TimeRange};
use crate::sort::{SortState, SortValue, Sortable};

/// Column to sort by in the Services view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceColumn {
    #[default]
    Name,
    Status,
    P50,
    P95,
    P99,
    ErrorRate,
    Requests,
    Rps,
}

impl ServiceColumn {
    pub const ALL: [ServiceColumn; 8] = [
        ServiceColumn::Name,
        ServiceColumn::Status,
        ServiceColumn::P50,
        ServiceColumn::P95,
        ServiceColumn::P99,
        ServiceColumn::ErrorRate,
        ServiceColumn::Requests,
        ServiceColumn::Rps,
    ];

    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            ServiceColumn::Name => ServiceColumn::Status,
            ServiceColumn::Status => ServiceColumn::P50,
            ServiceColumn::P50 => ServiceColumn::P95,
            ServiceColumn::P95 => ServiceColumn::P99,
            ServiceColumn::P99 => ServiceColumn::ErrorRate,
            ServiceColumn::ErrorRate => ServiceColumn::Requests,
            ServiceColumn::Requests => ServiceColumn::Rps,
            ServiceColumn::Rps => ServiceColumn::Name,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceColumn::Name => "Service",
            ServiceColumn::Status => "Status",
            ServiceColumn::P50 => "P50",
            ServiceColumn::P95 => "P95",
            ServiceColumn::P99 => "P99",
            ServiceColumn::ErrorRate => "Error Rate",
            ServiceColumn::Requests => "Requests",
            ServiceColumn::Rps => "RPS",
        }
    }

    fn width(&self) -> Constraint {
        match self {
            ServiceColumn::Name => Constraint::Fill(3),
            _ => Constraint::Fill(1),
        }
    }
}

impl Sortable<ServiceColumn> for ServiceHealth {
    fn sort_value(&self, column: ServiceColumn) -> SortValue<'_> {
        match column {
            ServiceColumn::Name => SortValue::Text(&self.service_name),
            ServiceColumn::Status => SortValue::Number(f64::from(self.health_status.severity())),
            ServiceColumn::P50 => SortValue::Number(self.current_latency_p50),
            ServiceColumn::P95 => SortValue::Number(self.current_latency_p95),
            ServiceColumn::P99 => SortValue::Number(self.current_latency_p99),
            ServiceColumn::ErrorRate => SortValue::Number(self.error_rate),
            ServiceColumn::Requests => SortValue::Number(self.request_count as f64),
            ServiceColumn::Rps => SortValue::Number(self.requests_per_second),
        }
    }

    fn identity(&self) -> &str {
        &self.service_name
    }
}

/// State of the Services table.
#[derive(Debug, Clone)]
pub struct ServicesState {
    pub sort: SortState<ServiceColumn>,
    /// View-level range, one of [`TimeRange::SELECTOR`].
    pub time_range: TimeRange,
    /// Visual index of the selected row.
    pub selected: usize,
    /// Scroll offset kept between frames.
    pub table: TableState,
    /// Header cell areas from the last render, for mouse sorting.
    pub header_hits: Vec<(Rect, ServiceColumn)>,
    /// First data row on screen from the last render.
    pub first_row: u16,
}

impl ServicesState {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            sort: SortState::new(ServiceColumn::Name),
            time_range,
            selected: 0,
            table: TableState::default(),
            header_hits: Vec::new(),
            first_row: 0,
        }
    }

    /// Column whose header contains `pos`.
    pub fn header_at(&self, pos: Position) -> Option<ServiceColumn> {
        self.header_hits
            .iter()
            .find(|(rect, _)| rect.contains(pos))
            .map(|(_, column)| *column)
    }

    /// Visual row index at screen `row`, accounting for scrolling.
    pub fn row_at(&self, row: u16) -> Option<usize> {
        if row < self.first_row {
            return None;
        }
        Some(self.table.offset() + usize::from(row - self.first_row))
    }
}

/// Render the Services view.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let time_range = app.services.time_range;
    let query = app.queries.services(time_range);
    let title_base = format!(" Services [{}] ", time_range.label());
    if query.data.is_none() {
        super::common::render_query_state(frame, app, area, &title_base, "services", &query);
        return;
    }

    let rows_data = app.table_services();
    let total = query.data.map(Vec::len).unwrap_or(0);
    let sort = app.services.sort;

    if rows_data.is_empty() {
        let message = if total > 0 {
            "No services match filter"
        } else {
            "No services found"
        };
        let block = Block::default()
            .title(format!("{}{}", title_base, super::common::filter_info(app)))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let paragraph = Paragraph::new(message)
            .style(app.theme.muted)
            .alignment(ratatui::layout::Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        app.services.header_hits.clear();
        return;
    }

    let header = Row::new(
        ServiceColumn::ALL
            .iter()
            .map(|c| Cell::from(sort.header(c.label(), *c))),
    )
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = rows_data
        .iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(s.service_name.clone()),
                Cell::from(s.health_status.symbol()).style(app.theme.status_style(s.health_status)),
                Cell::from(format_ms(s.current_latency_p50)),
                Cell::from(format_ms(s.current_latency_p95)),
                Cell::from(format_ms(s.current_latency_p99)),
                Cell::from(format_rate(s.error_rate)),
                Cell::from(format_thousands(s.request_count)),
                Cell::from(format!("{:.2}", s.requests_per_second)),
            ])
        })
        .collect();

    let widths: Vec<Constraint> = ServiceColumn::ALL.iter().map(|c| c.width()).collect();
    let row_count = rows.len();
    let selected = app.services.selected.min(row_count.saturating_sub(1));

    let filter_info = super::common::filter_info(app);
    let position_info = if row_count > 0 {
        format!(" [{}/{}]", selected + 1, row_count)
    } else {
        String::new()
    };
    let title = format!(
        " Services ({}/{}) [{}] [s:sort {}{} t:range]{}{} ",
        row_count,
        total,
        time_range,
        sort.column.label(),
        sort.arrow(),
        filter_info,
        position_info
    );
    let error_suffix = query
        .error
        .map(|e| format!(" refresh failed: {} ", e))
        .unwrap_or_default();

    let block = Block::default()
        .title(title)
        .title_bottom(error_suffix)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let table = Table::new(rows, widths.clone())
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ")
        .highlight_spacing(HighlightSpacing::Always);

    app.services.selected = selected;
    app.services.table.select(if row_count > 0 { Some(selected) } else { None });
    frame.render_stateful_widget(table, area, &mut app.services.table);

    // Remember where headers and rows landed for mouse handling
    let columns_area = Rect {
        x: inner.x.saturating_add(2),
        width: inner.width.saturating_sub(2),
        height: 1,
        ..inner
    };
    let cells = Layout::horizontal(widths).spacing(1).split(columns_area);
    app.services.header_hits = cells.iter().copied().zip(ServiceColumn::ALL).collect();
    app.services.first_row = inner.y.saturating_add(1);
}
