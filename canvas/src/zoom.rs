//! Pan/zoom controller for the topology zoom layer.
//!
//! The controller owns the one [`Transform`] of a view. Gestures only move it
//! when the configured predicate accepts them, so ordinary drags and clicks on
//! the view never pan or zoom by accident. Every committed change is reported
//! synchronously through `on_change`, which is where the host re-applies the
//! layer transform and any scale-compensated styles.

#[cfg(test)]
#[path = "zoom_test.rs"]
mod zoom_test;

use crate::consts::{DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE, SCALE_FLOOR};
use crate::input::{Gesture, GestureKind};
use crate::transform::Transform;

/// Decides whether a gesture may mutate the transform.
pub type ZoomPredicate = Box<dyn Fn(&Gesture) -> bool>;

/// Invoked with the new transform after every committed change.
pub type ZoomCallback = Box<dyn FnMut(&Transform)>;

/// Inclusive bounds for the scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleExtent {
    min: f64,
    max: f64,
}

impl Default for ScaleExtent {
    fn default() -> Self {
        Self { min: DEFAULT_MIN_SCALE, max: DEFAULT_MAX_SCALE }
    }
}

impl ScaleExtent {
    /// Build an extent. `min` is raised to [`SCALE_FLOOR`] and `max` to `min`.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        let min = if min.is_finite() { min.max(SCALE_FLOOR) } else { SCALE_FLOOR };
        let max = if max.is_nan() { min } else { max.max(min) };
        Self { min, max }
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamp a candidate scale into the extent. Non-positive values map to `min`.
    #[must_use]
    pub fn clamp(&self, scale: f64) -> f64 {
        if scale.is_nan() || scale <= 0.0 {
            return self.min;
        }
        scale.clamp(self.min, self.max)
    }
}

/// Immutable controller configuration.
pub struct ZoomConfig {
    pub enabled: ZoomPredicate,
    pub on_change: ZoomCallback,
    pub extent: ScaleExtent,
}

impl ZoomConfig {
    pub fn new(
        enabled: impl Fn(&Gesture) -> bool + 'static,
        on_change: impl FnMut(&Transform) + 'static,
    ) -> Self {
        Self { enabled: Box::new(enabled), on_change: Box::new(on_change), extent: ScaleExtent::default() }
    }

    #[must_use]
    pub fn with_extent(mut self, extent: ScaleExtent) -> Self {
        self.extent = extent;
        self
    }
}

/// Predicate accepting gestures made with Meta or Alt held.
#[must_use]
pub fn modifier_held(gesture: &Gesture) -> bool {
    gesture.modifiers.meta || gesture.modifiers.alt
}

pub struct ZoomController {
    transform: Transform,
    config: ZoomConfig,
}

impl ZoomController {
    /// Create a controller at the identity transform.
    #[must_use]
    pub fn new(config: ZoomConfig) -> Self {
        Self { transform: Transform::IDENTITY, config }
    }

    /// Return to the identity transform and notify `on_change`.
    pub fn reset(&mut self) {
        self.transform = Transform::IDENTITY;
        self.notify();
    }

    /// Compose a gesture into the transform.
    ///
    /// Returns `true` when the transform was committed and `on_change` fired.
    /// Gestures rejected by the predicate, carrying non-finite numbers, or
    /// whose result would overflow the transform leave everything untouched.
    pub fn on_gesture(&mut self, gesture: &Gesture) -> bool {
        if !(self.config.enabled)(gesture) {
            return false;
        }
        if !gesture.is_finite() {
            tracing::debug!(?gesture, "ignoring non-finite gesture");
            return false;
        }

        let mut t = self.transform;
        match gesture.kind {
            GestureKind::Pan { dx, dy } => {
                t.translate_x += dx;
                t.translate_y += dy;
            }
            GestureKind::Zoom { factor, anchor } => {
                let next = self.config.extent.clamp(t.scale * factor);
                let k = next / t.scale;
                t.translate_x = anchor.x - (anchor.x - t.translate_x) * k;
                t.translate_y = anchor.y - (anchor.y - t.translate_y) * k;
                t.scale = next;
            }
        }
        if !(t.translate_x.is_finite() && t.translate_y.is_finite() && t.scale.is_finite()) {
            tracing::debug!(?gesture, "ignoring gesture that overflows the transform");
            return false;
        }

        self.transform = t;
        self.notify();
        true
    }

    #[must_use]
    pub fn translate(&self) -> (f64, f64) {
        (self.transform.translate_x, self.transform.translate_y)
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    #[must_use]
    pub fn extent(&self) -> ScaleExtent {
        self.config.extent
    }

    fn notify(&mut self) {
        (self.config.on_change)(&self.transform);
    }
}
