//! Dependency map rendering and interaction.
//!
//! The [`GraphView`] owns the force layout while the Map view is mounted.
//! It is rebuilt when the fetched graph changes and dropped on unmount.

use std::collections::HashMap;

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Position, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, Borders, Paragraph,
    },
    Frame,
};
use tracing::debug;

use crate::app::App;
use crate::data::{DependencyGraph, HealthStatus};
use crate::graph::{validate, ForceLayout, LinearScale, StrokeWeight, ValidatedGraph, Viewport};

/// Node radius in layout units.
const NODE_RADIUS: f64 = 12.0;
/// Wheel zoom step.
const ZOOM_STEP: f64 = 1.2;
/// Cells moved per arrow key press.
const PAN_STEP: i32 = 4;
/// Alpha target while a node is dragged.
const DRAG_ALPHA_TARGET: f64 = 0.3;

/// Mounted graph: the input it was built from plus its layout.
#[derive(Debug)]
struct Mounted {
    source: DependencyGraph,
    graph: ValidatedGraph,
    layout: ForceLayout,
    scale: LinearScale,
}

/// An in-progress mouse gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    /// Pressed on a node. Becomes a drag once the pointer moves.
    Node {
        index: usize,
        start: Position,
        moved: bool,
    },
    /// Panning the background.
    Pan { last: Position },
}

/// State of the dependency map component.
#[derive(Debug, Default)]
pub struct GraphView {
    mounted: Option<Mounted>,
    pub viewport: Viewport,
    focus: Option<usize>,
    gesture: Option<Gesture>,
    /// Canvas area from the last render.
    canvas: Rect,
}

impl GraphView {
    /// Build (or keep) the layout for `data`.
    ///
    /// The layout is only rebuilt when the node or edge set differs from the
    /// mounted one; a metrics-only refresh updates the mounted graph in place.
    /// Nodes that survive a rebuild keep their positions, pins, focus and any
    /// drag in progress, matched by id.
    pub fn mount(&mut self, data: &DependencyGraph) {
        if self.mounted.as_ref().is_some_and(|m| &m.source == data) {
            return;
        }

        let graph = validate(data);

        if let Some(ref mut m) = self.mounted {
            if shape(&m.graph) == shape(&graph) {
                refresh_metrics(&mut m.graph, graph);
                m.scale = LinearScale::for_max(m.graph.max_call_count());
                m.source = data.clone();
                debug!("dependency graph metrics refreshed");
                return;
            }
        }

        let mut layout = ForceLayout::new(graph.nodes.len(), &graph.links);
        let mut focus = None;
        let mut gesture = None;

        if let Some(previous) = self.mounted.take() {
            let remap = |i: usize| {
                previous
                    .graph
                    .nodes
                    .get(i)
                    .and_then(|node| graph.index_of(&node.id))
            };

            for (node, p) in previous.graph.nodes.iter().zip(previous.layout.nodes()) {
                let Some(i) = graph.index_of(&node.id) else {
                    continue;
                };
                layout.place(i, p.x, p.y);
                if let (Some(fx), Some(fy)) = (p.fx, p.fy) {
                    layout.pin(i, fx, fy);
                }
            }

            focus = self.focus.and_then(remap);
            gesture = match self.gesture {
                Some(Gesture::Node {
                    index,
                    start,
                    moved,
                }) => remap(index).map(|index| Gesture::Node {
                    index,
                    start,
                    moved,
                }),
                other => other,
            };
            if matches!(gesture, Some(Gesture::Node { .. })) {
                layout.set_alpha_target(DRAG_ALPHA_TARGET);
            }
        }

        debug!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            dropped = graph.dropped.len(),
            "dependency graph mounted"
        );

        self.focus = focus;
        self.gesture = gesture;
        self.mounted = Some(Mounted {
            scale: LinearScale::for_max(graph.max_call_count()),
            source: data.clone(),
            graph,
            layout,
        });
    }

    /// Drop the layout; the next mount starts from scratch.
    pub fn unmount(&mut self) {
        if self.mounted.take().is_some() {
            debug!("dependency graph unmounted");
        }
        self.gesture = None;
        self.focus = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn node_count(&self) -> usize {
        self.mounted.as_ref().map_or(0, |m| m.graph.nodes.len())
    }

    /// Number of edges left out because they reference unknown nodes.
    pub fn dropped_edges(&self) -> usize {
        self.mounted.as_ref().map_or(0, |m| m.graph.dropped.len())
    }

    /// Whether the simulation is still moving.
    pub fn is_hot(&self) -> bool {
        self.mounted.as_ref().is_some_and(|m| m.layout.is_running())
    }

    /// Advance the simulation by one tick if it is running.
    pub fn tick(&mut self) -> bool {
        match self.mounted {
            Some(ref mut m) => m.layout.step(),
            None => false,
        }
    }

    pub fn focused_id(&self) -> Option<&str> {
        let m = self.mounted.as_ref()?;
        m.graph.nodes.get(self.focus?).map(|n| n.id.as_str())
    }

    pub fn focus_next(&mut self) {
        let count = self.node_count();
        if count > 0 {
            self.focus = Some(self.focus.map_or(0, |i| (i + 1) % count));
        }
    }

    pub fn focus_prev(&mut self) {
        let count = self.node_count();
        if count > 0 {
            self.focus = Some(self.focus.map_or(count - 1, |i| (i + count - 1) % count));
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom_centered(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_centered(1.0 / ZOOM_STEP);
    }

    fn zoom_centered(&mut self, factor: f64) {
        let (w, h) = (self.canvas.width, self.canvas.height);
        self.viewport.zoom_at(factor, w / 2, h / 2, w, h);
    }

    /// Pan by arrow key in direction `(dx, dy)`: the view moves, the content follows the other way.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan_cells(-dx * PAN_STEP, -dy * PAN_STEP);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    /// Handle a mouse event over the map.
    ///
    /// Pressing a node pins it and reheats the simulation; dragging moves
    /// the pin; releasing unpins it. A press and release without movement
    /// calls `on_select` with the node id. Presses on the background pan.
    pub fn handle_mouse(&mut self, mouse: MouseEvent, mut on_select: impl FnMut(&str)) {
        let pos = Position::new(mouse.column, mouse.row);
        let inside = self.canvas.contains(pos);

        match mouse.kind {
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown if inside => {
                let factor = if mouse.kind == MouseEventKind::ScrollUp {
                    ZOOM_STEP
                } else {
                    1.0 / ZOOM_STEP
                };
                let (col, row) = self.relative(pos);
                self.viewport
                    .zoom_at(factor, col, row, self.canvas.width, self.canvas.height);
            }
            MouseEventKind::Down(MouseButton::Left) if inside => {
                let (x, y) = self.world(pos);
                match self.node_at(x, y) {
                    Some(index) => {
                        if let Some(ref mut m) = self.mounted {
                            if let Some((nx, ny)) = m.layout.position(index) {
                                m.layout.pin(index, nx, ny);
                            }
                            m.layout.set_alpha_target(DRAG_ALPHA_TARGET);
                            m.layout.restart();
                        }
                        self.focus = Some(index);
                        self.gesture = Some(Gesture::Node {
                            index,
                            start: pos,
                            moved: false,
                        });
                    }
                    None => self.gesture = Some(Gesture::Pan { last: pos }),
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.gesture {
                Some(Gesture::Node { index, start, moved }) => {
                    let (x, y) = self.world(pos);
                    if let Some(ref mut m) = self.mounted {
                        m.layout.pin(index, x, y);
                    }
                    self.gesture = Some(Gesture::Node {
                        index,
                        start,
                        moved: moved || pos != start,
                    });
                }
                Some(Gesture::Pan { last }) => {
                    let dx = i32::from(pos.x) - i32::from(last.x);
                    let dy = i32::from(pos.y) - i32::from(last.y);
                    self.viewport.pan_cells(dx, dy);
                    self.gesture = Some(Gesture::Pan { last: pos });
                }
                None => {}
            },
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(Gesture::Node { index, moved, .. }) = self.gesture.take() {
                    if let Some(ref mut m) = self.mounted {
                        m.layout.unpin(index);
                        m.layout.set_alpha_target(0.0);
                        if !moved {
                            if let Some(node) = m.graph.nodes.get(index) {
                                on_select(&node.id);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn relative(&self, pos: Position) -> (u16, u16) {
        (
            pos.x.saturating_sub(self.canvas.x),
            pos.y.saturating_sub(self.canvas.y),
        )
    }

    fn world(&self, pos: Position) -> (f64, f64) {
        let (col, row) = self.relative(pos);
        self.viewport
            .screen_to_world(col, row, self.canvas.width, self.canvas.height)
    }

    fn node_at(&self, x: f64, y: f64) -> Option<usize> {
        let m = self.mounted.as_ref()?;
        // At least a cell and a half around the center, so small nodes stay clickable
        let (cell_w, _) = self.viewport.cell_size();
        m.layout.node_at(x, y, NODE_RADIUS.max(cell_w * 1.5))
    }
}

/// Node ids and link endpoints, ignoring order and metrics.
fn shape(graph: &ValidatedGraph) -> (Vec<&str>, Vec<(&str, &str)>) {
    let id = |i: usize| graph.nodes[i].id.as_str();
    let mut nodes: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut links: Vec<(&str, &str)> = graph
        .links
        .iter()
        .map(|l| (id(l.source), id(l.target)))
        .collect();
    nodes.sort_unstable();
    links.sort_unstable();
    (nodes, links)
}

/// Copy node and link metrics from `fresh` into `mounted`, which has the
/// same shape but possibly a different order.
fn refresh_metrics(mounted: &mut ValidatedGraph, fresh: ValidatedGraph) {
    let mut counts: HashMap<(&str, &str), Vec<u64>> = HashMap::new();
    for link in fresh.links.iter().rev() {
        let key = (
            fresh.nodes[link.source].id.as_str(),
            fresh.nodes[link.target].id.as_str(),
        );
        counts.entry(key).or_default().push(link.call_count);
    }
    for link in mounted.links.iter_mut() {
        let key = (
            mounted.nodes[link.source].id.as_str(),
            mounted.nodes[link.target].id.as_str(),
        );
        if let Some(count) = counts.get_mut(&key).and_then(Vec::pop) {
            link.call_count = count;
        }
    }
    drop(counts);

    for node in mounted.nodes.iter_mut() {
        if let Some(i) = fresh.index_of(&node.id) {
            *node = fresh.nodes[i].clone();
        }
    }
    mounted.dropped = fresh.dropped;
}

/// Render the Map view.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let time_range = app.map_time_range;
    let query = app.queries.dependency_graph(time_range);
    let title = format!(" Dependency Map [{}] ", time_range.label());
    if query.data.is_none() || !app.graph.is_mounted() {
        super::common::render_query_state(frame, app, area, &title, "dependency graph", &query);
        return;
    }
    let error_suffix = query
        .error
        .map(|e| format!(" refresh failed: {} ", e))
        .unwrap_or_default();

    let view = &app.graph;
    let theme = &app.theme;
    let Some(m) = view.mounted.as_ref() else {
        return;
    };

    let dropped = match view.dropped_edges() {
        0 => String::new(),
        n => format!(", {} dropped", n),
    };
    let full_title = format!(
        "{}({} services, {} edges{}) [t:range] ",
        title,
        m.graph.nodes.len(),
        m.graph.links.len(),
        dropped
    );

    let legend = Line::from(vec![
        Span::styled(" ● ", Style::default().fg(theme.node_color(HealthStatus::Healthy))),
        Span::raw("healthy "),
        Span::styled("● ", Style::default().fg(theme.node_color(HealthStatus::Warning))),
        Span::raw("warning "),
        Span::styled("● ", Style::default().fg(theme.node_color(HealthStatus::Critical))),
        Span::raw(format!("critical │ zoom {:.1}x {}", view.viewport.zoom(), error_suffix)),
    ]);

    let block = Block::default()
        .title(full_title)
        .title_bottom(legend)
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);

    if m.graph.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No services in dependency graph",
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(paragraph, area);
        app.graph.canvas = inner;
        return;
    }

    let viewport = view.viewport;
    let (dot_w, _) = viewport.cell_size();
    // Braille dots are half a cell wide
    let dot = dot_w / 2.0;
    let focus = view.focus;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(viewport.x_bounds(inner.width))
        .y_bounds(viewport.y_bounds(inner.height))
        .paint(|ctx| {
            let nodes = m.layout.nodes();
            for link in &m.graph.links {
                let (a, b) = (nodes[link.source], nodes[link.target]);
                if link.source == link.target {
                    // Self loop: a ring touching the node's upper right
                    ctx.draw(&Circle {
                        x: a.x + NODE_RADIUS,
                        y: -a.y + NODE_RADIUS,
                        radius: NODE_RADIUS,
                        color: theme.edge,
                    });
                    continue;
                }
                let offsets: &[f64] = match m.scale.stroke(link.call_count) {
                    StrokeWeight::Thin => &[0.0],
                    StrokeWeight::Normal => &[0.0, 1.0],
                    StrokeWeight::Heavy => &[-1.0, 0.0, 1.0],
                };
                // Offset parallel strokes perpendicular to the edge
                let (dx, dy) = (b.x - a.x, b.y - a.y);
                let len = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
                let (px, py) = (-dy / len * dot, dx / len * dot);
                for k in offsets {
                    ctx.draw(&CanvasLine {
                        x1: a.x + px * k,
                        y1: -(a.y + py * k),
                        x2: b.x + px * k,
                        y2: -(b.y + py * k),
                        color: theme.edge,
                    });
                }
            }
            ctx.layer();

            for (i, (node, p)) in m.graph.nodes.iter().zip(nodes).enumerate() {
                let color = theme.node_color(node.health);
                ctx.draw(&Circle {
                    x: p.x,
                    y: -p.y,
                    radius: NODE_RADIUS,
                    color,
                });
                if focus == Some(i) {
                    ctx.draw(&Circle {
                        x: p.x,
                        y: -p.y,
                        radius: NODE_RADIUS * 1.6,
                        color: theme.highlight,
                    });
                }
            }
            ctx.layer();

            for (i, (node, p)) in m.graph.nodes.iter().zip(nodes).enumerate() {
                let style = if focus == Some(i) {
                    theme.header
                } else {
                    Style::default().fg(theme.node_color(node.health))
                };
                ctx.print(
                    p.x + NODE_RADIUS,
                    -p.y - NODE_RADIUS,
                    Line::styled(node.id.clone(), style),
                );
            }
        });

    frame.render_widget(canvas, area);
    app.graph.canvas = inner;
}
