//! Pan and zoom transform between layout space and terminal cells.

/// Smallest zoom factor.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest zoom factor.
pub const MAX_ZOOM: f64 = 4.0;

/// Layout units covered by one terminal column at zoom 1.
const UNITS_PER_COL: f64 = 8.0;
/// Layout units covered by one terminal row at zoom 1 (cells are about twice as tall as wide).
const UNITS_PER_ROW: f64 = 16.0;

/// Visible window onto the layout: a center point and a zoom factor.
///
/// Screen positions are given relative to the drawing area, in cells.
/// Layout y grows downward like screen rows; the canvas flips it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center_x: f64,
    pub center_y: f64,
    zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Layout units covered by one cell, `(width, height)`, at the current zoom.
    pub fn cell_size(&self) -> (f64, f64) {
        (self.col_units(), self.row_units())
    }

    fn col_units(&self) -> f64 {
        UNITS_PER_COL / self.zoom
    }

    fn row_units(&self) -> f64 {
        UNITS_PER_ROW / self.zoom
    }

    /// Canvas x bounds for an area `width` columns wide.
    pub fn x_bounds(&self, width: u16) -> [f64; 2] {
        let half = f64::from(width) / 2.0 * self.col_units();
        [self.center_x - half, self.center_x + half]
    }

    /// Canvas y bounds (canvas y is negated layout y) for an area `height` rows tall.
    pub fn y_bounds(&self, height: u16) -> [f64; 2] {
        let half = f64::from(height) / 2.0 * self.row_units();
        [-self.center_y - half, -self.center_y + half]
    }

    /// Layout position at the center of cell `(col, row)`.
    pub fn screen_to_world(&self, col: u16, row: u16, width: u16, height: u16) -> (f64, f64) {
        let dx = f64::from(col) + 0.5 - f64::from(width) / 2.0;
        let dy = f64::from(row) + 0.5 - f64::from(height) / 2.0;
        (
            self.center_x + dx * self.col_units(),
            self.center_y + dy * self.row_units(),
        )
    }

    /// Cell containing layout position `(x, y)`, if it is inside the area.
    pub fn world_to_screen(&self, x: f64, y: f64, width: u16, height: u16) -> Option<(u16, u16)> {
        let col = (x - self.center_x) / self.col_units() + f64::from(width) / 2.0;
        let row = (y - self.center_y) / self.row_units() + f64::from(height) / 2.0;
        if col < 0.0 || row < 0.0 || col >= f64::from(width) || row >= f64::from(height) {
            return None;
        }
        Some((col as u16, row as u16))
    }

    /// Multiply the zoom by `factor`, keeping the layout point under
    /// `(col, row)` in place.
    pub fn zoom_at(&mut self, factor: f64, col: u16, row: u16, width: u16, height: u16) {
        let (wx, wy) = self.screen_to_world(col, row, width, height);
        self.set_zoom(self.zoom * factor);
        let dx = f64::from(col) + 0.5 - f64::from(width) / 2.0;
        let dy = f64::from(row) + 0.5 - f64::from(height) / 2.0;
        self.center_x = wx - dx * self.col_units();
        self.center_y = wy - dy * self.row_units();
    }

    /// Move the content by `(cols, rows)` cells, as when dragging the background.
    pub fn pan_cells(&mut self, cols: i32, rows: i32) {
        self.center_x -= f64::from(cols) * self.col_units();
        self.center_y -= f64::from(rows) * self.row_units();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::default();
        viewport.set_zoom(100.0);
        assert_eq!(viewport.zoom(), MAX_ZOOM);
        viewport.set_zoom(0.0);
        assert_eq!(viewport.zoom(), MIN_ZOOM);
        viewport.set_zoom(f64::NAN);
        assert_eq!(viewport.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_screen_world_round_trip() {
        let mut viewport = Viewport::default();
        viewport.pan_cells(3, -2);
        viewport.set_zoom(2.0);
        let (x, y) = viewport.screen_to_world(17, 9, 80, 24);
        assert_eq!(viewport.world_to_screen(x, y, 80, 24), Some((17, 9)));
        assert_eq!(viewport.world_to_screen(1e6, 0.0, 80, 24), None);
    }

    #[test]
    fn test_zoom_at_keeps_point_under_cursor() {
        let mut viewport = Viewport::default();
        let before = viewport.screen_to_world(10, 5, 80, 24);
        viewport.zoom_at(1.5, 10, 5, 80, 24);
        let after = viewport.screen_to_world(10, 5, 80, 24);
        assert!((before.0 - after.0).abs() < 1e-9);
        assert!((before.1 - after.1).abs() < 1e-9);
        assert_eq!(viewport.zoom(), 1.5);
    }

    #[test]
    fn test_bounds_flip_y() {
        let mut viewport = Viewport::default();
        viewport.center_y = 100.0;
        let [lo, hi] = viewport.y_bounds(10);
        assert_eq!(lo, -180.0);
        assert_eq!(hi, -20.0);
        assert_eq!(viewport.x_bounds(10), [-40.0, 40.0]);
    }
}
