#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use serde::{Deserialize, Serialize};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pan/zoom state applied to the zoom layer.
///
/// `translate_x` / `translate_y` are in screen pixels.
/// `scale` is a factor (1.0 = no zoom) and is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self { translate_x: 0.0, translate_y: 0.0, scale: 1.0 };

    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Convert a screen-space point to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.translate_x) / self.scale,
            y: (screen.y - self.translate_y) / self.scale,
        }
    }

    /// Convert a world-space point to screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.scale + self.translate_x,
            y: world.y * self.scale + self.translate_y,
        }
    }

    /// World-space size that renders as `screen_size` pixels at this scale.
    ///
    /// Used to keep stroke widths constant on screen while zooming.
    #[must_use]
    pub fn compensate(&self, screen_size: f64) -> f64 {
        screen_size / self.scale
    }

    /// SVG `transform` attribute value for this state.
    #[must_use]
    pub fn to_svg(&self) -> String {
        format!(
            "translate({},{})scale({})",
            self.translate_x, self.translate_y, self.scale
        )
    }
}
