//! Shared numeric constants for the canvas crate.

// ── Zoom ────────────────────────────────────────────────────────

/// Default lower scale bound.
pub const DEFAULT_MIN_SCALE: f64 = 0.25;

/// Default upper scale bound.
pub const DEFAULT_MAX_SCALE: f64 = 10.0;

/// Smallest scale any extent may allow; keeps the transform invertible.
pub const SCALE_FLOOR: f64 = 1e-6;

/// Exponent per wheel pixel: one 500px scroll doubles or halves the scale.
pub const WHEEL_ZOOM_RATE: f64 = 0.002;

// ── Styling ─────────────────────────────────────────────────────

/// On-screen stroke width of background map lines, in pixels.
pub const MAP_STROKE_WIDTH_PX: f64 = 2.0;
