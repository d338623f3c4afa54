//! Dependency graph model: validation, edge scaling, force layout and viewport.
//!
//! ```text
//! DependencyGraph (API)
//!    │ validate()
//!    ▼
//! ValidatedGraph ──▶ ForceLayout (ticked by the UI loop)
//!                        │
//!                        ▼
//!                    Viewport (pan/zoom) ──▶ ui::graph canvas
//! ```

pub mod layout;
pub mod scale;
pub mod validate;
pub mod viewport;

pub use layout::{ForceLayout, ForceParams, LayoutNode};
pub use scale::{LinearScale, StrokeWeight};
pub use validate::{validate, DropReason, DroppedEdge, Link, ValidatedGraph};
pub use viewport::{Viewport, MAX_ZOOM, MIN_ZOOM};
