//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, help overlay,
//! and the loading/error panel shown while a query has no data.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_duration;
use crate::data::HealthStatus;
use crate::query::Query;

/// Render the header bar with overall service health.
///
/// Displays: status indicator, service counts by health, time range and refresh interval.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let range = app.context.time_range();
    let refresh = format_duration(app.queries.refetch_interval());

    let Some(counts) = app.health_counts() else {
        let line = Line::from(vec![
            Span::styled(" SERVICEWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("│ Loading... "),
            Span::raw(format!("│ {} │ refresh {}", range.label(), refresh)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let dim = Style::default().add_modifier(Modifier::DIM);
    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.status_style(counts.overall())),
        Span::styled("SERVICEWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            counts.healthy.to_string(),
            app.theme.status_style(HealthStatus::Healthy),
        ),
        Span::raw(" healthy "),
        if counts.warning > 0 {
            Span::styled(
                counts.warning.to_string(),
                app.theme.status_style(HealthStatus::Warning),
            )
        } else {
            Span::styled("0", dim)
        },
        Span::raw(" warning "),
        if counts.critical > 0 {
            Span::styled(
                counts.critical.to_string(),
                app.theme.status_style(HealthStatus::Critical),
            )
        } else {
            Span::styled("0", dim)
        },
        Span::raw(" critical │ "),
        Span::styled(
            counts.total().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" services │ "),
        Span::raw(range.label()),
        Span::raw(format!(" │ refresh {}", refresh)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn tab_title(view: View) -> String {
    format!(" {}:{} ", view.index() + 1, view.label())
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL.iter().map(|v| Line::from(tab_title(*v))).collect();

    let tabs = Tabs::new(titles)
        .select(app.current_view.index())
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// The tab under column `col` of the tab bar.
pub fn tab_at(col: u16) -> Option<View> {
    // Each tab is padded by one space on both sides and followed by a divider
    let mut start = 0u16;
    for view in View::ALL {
        let width = tab_title(view).chars().count() as u16 + 2;
        if col < start + width {
            return Some(view);
        }
        start += width + 1;
    }
    None
}

/// Render the status bar at the bottom.
///
/// Shows: current view, time since last update, available controls.
/// Also displays temporary status messages.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.filter_active {
        "Type to search | Enter:apply Esc:cancel"
    } else if app.overlay_open() {
        "Esc:close t:range r:reload ?:help q:quit"
    } else {
        match app.current_view {
            View::Dashboard => "←→↑↓:select Enter:detail /:search t:range Tab:switch ?:help q:quit",
            View::Services => "/:search s:sort S:reverse t:range Enter:detail Tab:switch ?:help q:quit",
            View::Map => "drag/click:nodes scroll/+-:zoom ←→↑↓:pan 0:reset n:focus Enter:detail t:range",
            View::Traces => "/:search s:sort S:reverse f:service Enter:detail Tab:switch ?:help q:quit",
        }
    };

    let freshness = match app.queries.updated_at(&app.primary_query()) {
        Some(at) => format!("Updated {:.1}s ago", at.elapsed().as_secs_f64()),
        None if app.queries.in_flight() > 0 => "Loading...".to_string(),
        None => "No data".to_string(),
    };

    let status = format!(" {} | {} | {}", app.current_view.label(), freshness, controls);
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Filter text to append to a view title.
pub fn filter_info(app: &App) -> String {
    if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    }
}

/// Render the loading indicator or error panel of a query without data.
pub fn render_query_state<T>(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    subject: &str,
    query: &Query<'_, T>,
) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let lines = match query.error {
        Some(err) => vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("Failed to load {}", subject),
                app.theme.status_style(HealthStatus::Critical),
            )),
            Line::from(""),
            Line::from(err.to_string()),
            Line::from(""),
            Line::from(Span::styled("Press r to retry", app.theme.muted)),
        ],
        None => vec![
            Line::from(""),
            Line::from(Span::styled(format!("Loading {}...", subject), app.theme.muted)),
        ],
    };

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Area of a centered box at most `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |name: &'static str| {
        Line::from(vec![Span::styled(
            name,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab/S-Tab   Switch views"),
        Line::from("  1-4         Jump to view"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Open detail"),
        Line::from("  Esc         Close detail / go back"),
        Line::from(""),
        section(" Tables"),
        Line::from("  /           Start filter/search"),
        Line::from("  c           Clear filter"),
        Line::from("  s           Cycle sort column"),
        Line::from("  S           Toggle sort direction"),
        Line::from("  f           Filter traces by service"),
        Line::from(""),
        section(" Dependency Map"),
        Line::from("  mouse       Drag nodes, click to open"),
        Line::from("  ←→↑↓        Pan"),
        Line::from("  +/- wheel   Zoom"),
        Line::from("  0           Reset view"),
        Line::from("  n/N         Focus next/prev node"),
        Line::from(""),
        section(" General"),
        Line::from("  t           Cycle time range"),
        Line::from("  r           Reload data"),
        Line::from("  e           Export to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let help_height = help_text.len() as u16 + 2;
    let paragraph = Paragraph::new(help_text).block(block);

    let help_area = centered(
        area,
        44u16.min(area.width.saturating_sub(4)),
        help_height.min(area.height.saturating_sub(2)),
    );

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_at_matches_rendered_tabs() {
        // " 1:Dashboard " is 13 wide, padded to 15, then a divider
        assert_eq!(tab_at(0), Some(View::Dashboard));
        assert_eq!(tab_at(14), Some(View::Dashboard));
        assert_eq!(tab_at(16), Some(View::Services));
        assert_eq!(tab_at(200), None);
    }

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 20, 10);
        let inner = centered(area, 50, 4);
        assert_eq!(inner, Rect::new(0, 3, 20, 4));
    }
}
