//! Rendering-surface contract.
//!
//! The view never touches the DOM directly. It drives a [`RenderSurface`]
//! that hands out layer handles and accepts style and transform updates; the
//! host decides whether those become SVG groups, canvas state, or log lines.

use crate::transform::Transform;

/// Opaque handle to a drawing layer owned by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

impl LayerId {
    /// The surface's top-level layer (the `<svg>` element).
    pub const ROOT: Self = Self(0);
}

pub trait RenderSurface {
    /// The top-level layer every other layer descends from.
    fn root(&self) -> LayerId {
        LayerId::ROOT
    }

    /// Append a child layer named `name` under `parent`.
    fn append_layer(&mut self, parent: LayerId, name: &str) -> LayerId;

    /// Set a style property, e.g. `stroke-width`, on a layer.
    fn set_style(&mut self, layer: LayerId, property: &str, value: &str);

    /// Apply a pan/zoom transform to a layer.
    fn set_transform(&mut self, layer: LayerId, transform: &Transform);
}
