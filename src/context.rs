//! Shared selection state.
//!
//! Owned by [`App`](crate::App) and handed to views by reference. Views never
//! hold onto it; they read it while rendering and write it through the
//! methods below when the user selects something.

use crate::data::TimeRange;

/// Selected service, selected trace and the global time range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppContext {
    selected_service: Option<String>,
    selected_trace: Option<String>,
    time_range: TimeRange,
}

impl AppContext {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            ..Self::default()
        }
    }

    pub fn selected_service(&self) -> Option<&str> {
        self.selected_service.as_deref()
    }

    pub fn selected_trace(&self) -> Option<&str> {
        self.selected_trace.as_deref()
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Select a service, opening its detail overlay.
    ///
    /// A selected trace is cleared so only one overlay is open at a time.
    pub fn select_service(&mut self, service: impl Into<String>) {
        self.selected_trace = None;
        self.selected_service = Some(service.into());
    }

    /// Select a trace, opening its detail overlay.
    pub fn select_trace(&mut self, trace_id: impl Into<String>) {
        self.selected_service = None;
        self.selected_trace = Some(trace_id.into());
    }

    /// Close whichever overlay is open. Returns whether anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let had_selection = self.selected_service.is_some() || self.selected_trace.is_some();
        self.selected_service = None;
        self.selected_trace = None;
        had_selection
    }

    /// Advance the global time range through all options.
    pub fn cycle_time_range(&mut self) -> TimeRange {
        self.time_range = self.time_range.next_in(&TimeRange::ALL);
        self.time_range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selecting_one_overlay_clears_the_other() {
        let mut ctx = AppContext::new(TimeRange::OneHour);
        ctx.select_trace("t-1");
        ctx.select_service("checkout");
        assert_eq!(ctx.selected_service(), Some("checkout"));
        assert_eq!(ctx.selected_trace(), None);

        ctx.select_trace("t-2");
        assert_eq!(ctx.selected_service(), None);
        assert_eq!(ctx.selected_trace(), Some("t-2"));
    }

    #[test]
    fn test_clear_selection() {
        let mut ctx = AppContext::default();
        assert!(!ctx.clear_selection());
        ctx.select_service("payments");
        assert!(ctx.clear_selection());
        assert_eq!(ctx.selected_service(), None);
    }

    #[test]
    fn test_cycle_time_range_wraps() {
        let mut ctx = AppContext::new(TimeRange::FifteenMinutes);
        assert_eq!(ctx.cycle_time_range(), TimeRange::OneHour);
        assert_eq!(ctx.cycle_time_range(), TimeRange::TwentyFourHours);
        assert_eq!(ctx.cycle_time_range(), TimeRange::FifteenMinutes);
    }
}
