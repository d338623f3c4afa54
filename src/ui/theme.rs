//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use clap::ValueEnum;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;
use serde::Deserialize;

use crate::data::{ChangeTone, HealthStatus};

/// Dependency map node fill for healthy services, `hsl(160 60% 45%)`.
pub const NODE_HEALTHY: Color = Color::Rgb(46, 184, 138);
/// Dependency map node fill for warning services, `hsl(30 80% 55%)`.
pub const NODE_WARNING: Color = Color::Rgb(232, 140, 48);
/// Dependency map node fill for critical services, `hsl(0 63% 31%)`.
pub const NODE_CRITICAL: Color = Color::Rgb(129, 29, 29);

/// Theme selection from the command line or config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    /// Detect from the terminal background
    #[default]
    Auto,
    Dark,
    Light,
}

impl ThemeChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeChoice::Auto => "auto",
            ThemeChoice::Dark => "dark",
            ThemeChoice::Light => "light",
        }
    }
}

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for warning-level health status.
    pub warning: Color,
    /// Color for critical-level health status.
    pub critical: Color,
    /// Color for healthy status.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color for dependency map edges.
    pub edge: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Style for secondary text (labels, hints).
    pub muted: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            edge: Color::DarkGray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            muted: Style::default().add_modifier(Modifier::DIM),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            edge: Color::Gray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            muted: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn from_choice(choice: ThemeChoice) -> Self {
        match choice {
            ThemeChoice::Auto => Self::auto_detect(),
            ThemeChoice::Dark => Self::dark(),
            ThemeChoice::Light => Self::light(),
        }
    }

    /// Get style for a health status
    pub fn status_style(&self, status: HealthStatus) -> Style {
        match status {
            HealthStatus::Healthy => Style::default().fg(self.healthy),
            HealthStatus::Warning => Style::default().fg(self.warning),
            HealthStatus::Critical => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }

    /// Style for a health string that may not be a known status.
    pub fn health_text_style(&self, health: Option<HealthStatus>) -> Style {
        health.map(|h| self.status_style(h)).unwrap_or(self.muted)
    }

    /// Style for a baseline change indicator.
    pub fn change_style(&self, tone: ChangeTone) -> Style {
        match tone {
            ChangeTone::Neutral => self.muted,
            ChangeTone::Good => Style::default().fg(self.healthy),
            ChangeTone::Bad => Style::default().fg(self.critical),
        }
    }

    /// Fill color of a dependency map node.
    pub fn node_color(&self, status: HealthStatus) -> Color {
        match status {
            HealthStatus::Healthy => NODE_HEALTHY,
            HealthStatus::Warning => NODE_WARNING,
            HealthStatus::Critical => NODE_CRITICAL,
        }
    }
}
