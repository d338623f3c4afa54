//! Traces view rendering.

use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, HighlightSpacing, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::format::{format_ms, format_name_list, truncate};
use crate::data::TraceInfo;
use crate::sort::{SortState, SortValue, Sortable};

/// Service names listed per trace before the rest are counted.
const LISTED_SERVICES: usize = 5;

/// Column to sort by in the Traces view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceColumn {
    TraceId,
    StartTime,
    Duration,
    Spans,
    Services,
}

impl TraceColumn {
    pub const ALL: [TraceColumn; 5] = [
        TraceColumn::TraceId,
        TraceColumn::StartTime,
        TraceColumn::Duration,
        TraceColumn::Spans,
        TraceColumn::Services,
    ];

    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            TraceColumn::TraceId => TraceColumn::StartTime,
            TraceColumn::StartTime => TraceColumn::Duration,
            TraceColumn::Duration => TraceColumn::Spans,
            TraceColumn::Spans => TraceColumn::Services,
            TraceColumn::Services => TraceColumn::TraceId,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TraceColumn::TraceId => "Trace ID",
            TraceColumn::StartTime => "Start Time",
            TraceColumn::Duration => "Duration",
            TraceColumn::Spans => "Spans",
            TraceColumn::Services => "Services",
        }
    }

    fn width(&self) -> Constraint {
        match self {
            TraceColumn::TraceId => Constraint::Fill(3),
            TraceColumn::StartTime | TraceColumn::Services => Constraint::Fill(2),
            _ => Constraint::Fill(1),
        }
    }
}

impl Sortable<TraceColumn> for TraceInfo {
    fn sort_value(&self, column: TraceColumn) -> SortValue<'_> {
        match column {
            TraceColumn::TraceId => SortValue::Text(&self.trace_id),
            TraceColumn::StartTime => SortValue::Number(self.trace_start.timestamp_millis() as f64),
            TraceColumn::Duration => SortValue::Number(self.total_duration_ms),
            TraceColumn::Spans => SortValue::Number(self.span_count as f64),
            TraceColumn::Services => SortValue::Number(self.services_involved.len() as f64),
        }
    }

    fn identity(&self) -> &str {
        &self.trace_id
    }
}

/// State of the Traces table.
#[derive(Debug, Clone)]
pub struct TracesState {
    pub sort: SortState<TraceColumn>,
    /// Restrict to traces involving one service.
    pub service_filter: Option<String>,
    pub selected: usize,
    pub table: TableState,
    pub header_hits: Vec<(Rect, TraceColumn)>,
    pub first_row: u16,
}

impl Default for TracesState {
    fn default() -> Self {
        Self {
            // Newest first
            sort: SortState {
                column: TraceColumn::StartTime,
                ascending: false,
            },
            service_filter: None,
            selected: 0,
            table: TableState::default(),
            header_hits: Vec::new(),
            first_row: 0,
        }
    }
}

impl TracesState {
    pub fn header_at(&self, pos: Position) -> Option<TraceColumn> {
        self.header_hits
            .iter()
            .find(|(rect, _)| rect.contains(pos))
            .map(|(_, column)| *column)
    }

    pub fn row_at(&self, row: u16) -> Option<usize> {
        if row < self.first_row {
            return None;
        }
        Some(self.table.offset() + usize::from(row - self.first_row))
    }
}

/// Render the Traces view.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let time_range = app.context.time_range();
    let filter_label = app
        .traces
        .service_filter
        .clone()
        .unwrap_or_else(|| "All Services".to_string());
    let query = match app.traces.service_filter {
        Some(ref service) => app.queries.service_traces(service, time_range),
        None => app.queries.traces(time_range),
    };
    let title_base = format!(" Traces [{}] [{}] ", time_range.label(), filter_label);
    if query.data.is_none() {
        super::common::render_query_state(frame, app, area, &title_base, "traces", &query);
        return;
    }
    let error_suffix = query
        .error
        .map(|e| format!(" refresh failed: {} ", e))
        .unwrap_or_default();

    let rows_data = app.table_traces();
    let sort = app.traces.sort;
    let filter_info = super::common::filter_info(app);

    let block = Block::default()
        .title_bottom(error_suffix)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if rows_data.is_empty() {
        let block = block.title(format!("{}{}", title_base, filter_info));
        let paragraph = Paragraph::new("No traces found")
            .style(app.theme.muted)
            .alignment(ratatui::layout::Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(
        TraceColumn::ALL
            .iter()
            .map(|c| Cell::from(sort.header(c.label(), *c))),
    )
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = rows_data
        .iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(truncate(&t.trace_id, 36)),
                Cell::from(t.trace_start.format("%Y-%m-%d %H:%M:%S").to_string()),
                Cell::from(format_ms(t.total_duration_ms)),
                Cell::from(t.span_count.to_string()),
                Cell::from(format_name_list(&t.services_involved, LISTED_SERVICES)),
            ])
        })
        .collect();

    let row_count = rows.len();
    let selected = app.traces.selected.min(row_count.saturating_sub(1));
    let title = format!(
        " Traces ({}) [{}] [f:{}] [s:sort {}{}]{} [{}/{}] ",
        row_count,
        time_range,
        filter_label,
        sort.column.label(),
        sort.arrow(),
        filter_info,
        selected + 1,
        row_count
    );
    let block = block.title(title);
    let inner = block.inner(area);

    let widths: Vec<Constraint> = TraceColumn::ALL.iter().map(|c| c.width()).collect();
    let table = Table::new(rows, widths.clone())
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ")
        .highlight_spacing(HighlightSpacing::Always);

    app.traces.selected = selected;
    app.traces.table.select(Some(selected));
    frame.render_stateful_widget(table, area, &mut app.traces.table);

    let columns_area = Rect {
        x: inner.x.saturating_add(2),
        width: inner.width.saturating_sub(2),
        height: 1,
        ..inner
    };
    let cells = Layout::horizontal(widths).spacing(1).split(columns_area);
    app.traces.header_hits = cells.iter().copied().zip(TraceColumn::ALL).collect();
    app.traces.first_row = inner.y.saturating_add(1);
}
