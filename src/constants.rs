//! Centralized constants used across the application.
//!
//! Interaction tolerances here are the defaults for [`crate::config::EditorSettings`];
//! the live values come from the config file.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Pin hit radius in view pixels
pub const PIN_HIT_RADIUS: f32 = 10.0;

/// Pin marker radius in view pixels
pub const PIN_MARKER_RADIUS: f32 = 8.0;

/// Control point hit radius in view pixels
pub const CONTROL_POINT_RADIUS: f32 = 6.0;

/// Junction (shared point) hit radius in view pixels
pub const JUNCTION_POINT_RADIUS: f32 = 8.0;

/// Distance from a segment that still counts as a hit, in view pixels
pub const SEGMENT_HIT_TOLERANCE: f32 = 8.0;

/// Hover tolerances are the click tolerances scaled by this factor
pub const HOVER_TOLERANCE_SCALE: f32 = 1.5;

/// Snap distance for dragged control points, in view pixels
pub const SNAP_THRESHOLD: f32 = 15.0;

/// Smallest number of points a branch may have
pub const MIN_BRANCH_POINTS: usize = 2;

/// Clicks on a pin this soon after creation do not navigate
pub const CREATION_SUPPRESSION_MS: u64 = 500;

/// Zoom limits for the map view
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;

/// Default line color when the stored style has none
pub const DEFAULT_LINE_COLOR: &str = "#FF0000";

/// Default line width when the stored style is missing or unparsable
pub const DEFAULT_LINE_WIDTH: u32 = 2;

/// Widest stored line width accepted; larger values are clamped
pub const MAX_LINE_WIDTH: u32 = 64;

/// Upper bound on gizmo strokes drawn side by side for one wide line
pub const MAX_STROKE_WIDTH: f32 = 128.0;

/// Wheel zoom factor is `1 + delta / WHEEL_PIXEL_DIVISOR` for pixel deltas
pub const WHEEL_PIXEL_DIVISOR: f32 = 1200.0;

/// Wheel line units are converted to pixels with this factor
pub const WHEEL_LINE_PIXELS: f32 = 120.0;
