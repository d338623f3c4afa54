//! Dashboard view rendering.
//!
//! A grid of cards, one per service, for the global time range.

use ratatui::{
    layout::{Alignment, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::format::{format_ms, format_rate, format_thousands, truncate};
use crate::data::ServiceHealth;
use crate::ui::Theme;

/// Minimum card width including borders.
const CARD_WIDTH: u16 = 30;
/// Card height including borders.
const CARD_HEIGHT: u16 = 6;

/// Selection and layout of the card grid.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Index of the selected card.
    pub selected: usize,
    /// Cards per row in the last render.
    pub columns: usize,
    /// Card areas from the last render, for mouse selection.
    pub card_hits: Vec<(Rect, usize)>,
}

impl DashboardState {
    pub fn card_at(&self, pos: Position) -> Option<usize> {
        self.card_hits
            .iter()
            .find(|(rect, _)| rect.contains(pos))
            .map(|(_, index)| *index)
    }
}

/// Render the Dashboard view.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let time_range = app.context.time_range();
    let query = app.queries.services(time_range);
    let title = format!(" Service Health [{}] ", time_range.label());
    if query.data.is_none() {
        super::common::render_query_state(frame, app, area, &title, "services", &query);
        return;
    }

    let has_data = query.data.is_some_and(|d| !d.is_empty());
    let services = app.dashboard_services();
    let block = Block::default()
        .title(format!("{}{}", title, super::common::filter_info(app)))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if services.is_empty() {
        if has_data {
            render_no_match(frame, &app.theme, inner);
        } else {
            render_empty(frame, &app.theme, inner);
        }
        app.dashboard.card_hits.clear();
        return;
    }

    let columns = usize::from((inner.width / CARD_WIDTH).max(1));
    let card_width = inner.width / columns as u16;
    let visible_rows = usize::from((inner.height / CARD_HEIGHT).max(1));
    let selected = app.dashboard.selected.min(services.len() - 1);
    let selected_row = selected / columns;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    let mut hits = Vec::new();
    for (index, service) in services.iter().enumerate() {
        let row = index / columns;
        if row < first_row || row >= first_row + visible_rows {
            continue;
        }
        let col = index % columns;
        let card = Rect {
            x: inner.x + col as u16 * card_width,
            y: inner.y + (row - first_row) as u16 * CARD_HEIGHT,
            width: card_width,
            height: CARD_HEIGHT.min(inner.height),
        };
        render_card(frame, &app.theme, service, index == selected, card);
        hits.push((card, index));
    }

    app.dashboard.selected = selected;
    app.dashboard.columns = columns;
    app.dashboard.card_hits = hits;
}

fn render_card(
    frame: &mut Frame,
    theme: &Theme,
    service: &ServiceHealth,
    selected: bool,
    area: Rect,
) {
    let status_style = theme.status_style(service.health_status);
    let border_style = if selected {
        Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.border)
    };
    let name_width = usize::from(area.width.saturating_sub(4));
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", truncate(&service.service_name, name_width)),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(border_style);

    let lines = vec![
        Line::from(vec![
            Span::styled("● ", status_style),
            Span::styled(service.health_status.as_str(), status_style),
        ]),
        Line::from(vec![
            Span::styled("P95 ", theme.muted),
            Span::raw(format_ms(service.current_latency_p95)),
            Span::styled("  Err ", theme.muted),
            Span::raw(format_rate(service.error_rate)),
        ]),
        Line::from(vec![
            Span::styled("Req ", theme.muted),
            Span::raw(format_thousands(service.request_count)),
            Span::styled("  RPS ", theme.muted),
            Span::raw(format!("{:.2}", service.requests_per_second)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_empty(frame: &mut Frame, theme: &Theme, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No recent data",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "No services reported in this time range. Press t to select a longer time range.",
            theme.muted,
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(ratatui::widgets::Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Services exist but none pass the text filter.
fn render_no_match(frame: &mut Frame, theme: &Theme, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No services match filter",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Press c to clear the filter.", theme.muted)),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeRange;
    use crate::query::{Payload, QueryKey};
    use crate::test_support::{buffer_text, sample_services, settle_app, test_app, StubFetcher};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_services_shows_no_recent_data() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(QueryKey::Services(TimeRange::OneHour), Ok(Payload::Services(vec![])));
        let mut app = test_app(fetcher);
        settle_app(&mut app).await;

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, &mut app, area)
            })
            .unwrap();

        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("No recent data"));
        assert!(text.contains("longer time range"));
    }

    #[tokio::test]
    async fn test_filter_without_matches_says_so() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(
            QueryKey::Services(TimeRange::OneHour),
            Ok(Payload::Services(sample_services())),
        );
        let mut app = test_app(fetcher);
        settle_app(&mut app).await;
        app.filter_text = "zzz".to_string();

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, &mut app, area)
            })
            .unwrap();

        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("No services match filter"));
        assert!(!text.contains("No recent data"));
        assert!(app.dashboard.card_hits.is_empty());
    }

    #[tokio::test]
    async fn test_cards_render_and_record_grid() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(
            QueryKey::Services(TimeRange::OneHour),
            Ok(Payload::Services(sample_services())),
        );
        let mut app = test_app(fetcher);
        settle_app(&mut app).await;

        let mut terminal = Terminal::new(TestBackend::new(92, 20)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, &mut app, area)
            })
            .unwrap();

        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("checkout"));
        assert!(text.contains("critical"));
        assert_eq!(app.dashboard.columns, 3);
        assert_eq!(app.dashboard.card_hits.len(), sample_services().len().min(9));
    }
}
