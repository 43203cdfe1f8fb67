//! Input model: modifier keys, wheel deltas, and pan/zoom gestures.
//!
//! The host's gesture plumbing turns raw pointer and wheel events into
//! [`Gesture`]s. Each gesture carries the modifiers held when it happened so
//! the zoom predicate can decide whether it may move the view.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::WHEEL_ZOOM_RATE;
use crate::transform::Point;

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self { shift: false, ctrl: false, alt: false, meta: false };

    #[must_use]
    pub fn alt() -> Self {
        Self { alt: true, ..Self::NONE }
    }

    #[must_use]
    pub fn meta() -> Self {
        Self { meta: true, ..Self::NONE }
    }

    #[must_use]
    pub fn any(self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// What a gesture asks the view to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureKind {
    /// Drag the view by a screen-space delta.
    Pan { dx: f64, dy: f64 },
    /// Multiply the scale by `factor`, keeping `anchor` fixed on screen.
    Zoom { factor: f64, anchor: Point },
}

/// A recognized pan or zoom gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub kind: GestureKind,
    pub modifiers: Modifiers,
}

impl Gesture {
    #[must_use]
    pub fn pan(dx: f64, dy: f64, modifiers: Modifiers) -> Self {
        Self { kind: GestureKind::Pan { dx, dy }, modifiers }
    }

    #[must_use]
    pub fn zoom(factor: f64, anchor: Point, modifiers: Modifiers) -> Self {
        Self { kind: GestureKind::Zoom { factor, anchor }, modifiers }
    }

    /// Zoom gesture for a wheel tick at `anchor`. Scrolling up zooms in.
    #[must_use]
    pub fn wheel(delta: WheelDelta, anchor: Point, modifiers: Modifiers) -> Self {
        let factor = (-delta.dy * WHEEL_ZOOM_RATE).exp2();
        Self::zoom(factor, anchor, modifiers)
    }

    /// Whether every number in the gesture is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self.kind {
            GestureKind::Pan { dx, dy } => dx.is_finite() && dy.is_finite(),
            GestureKind::Zoom { factor, anchor } => {
                factor.is_finite() && anchor.x.is_finite() && anchor.y.is_finite()
            }
        }
    }
}
