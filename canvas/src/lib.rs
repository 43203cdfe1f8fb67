//! Pan/zoom and rendering-layer model for the topology view.
//!
//! This crate holds everything about how the topology is looked at, with no
//! knowledge of what is being looked at: the transform applied to the zoom
//! layer, the gestures that move it, the controller that gates and composes
//! those gestures, and the contract a rendering surface must satisfy.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`transform`] | Pan/zoom transform and coordinate conversions |
//! | [`input`] | Modifier keys, wheel deltas, and gestures |
//! | [`zoom`] | [`zoom::ZoomController`] and its configuration |
//! | [`surface`] | [`surface::RenderSurface`] contract and layer handles |
//! | [`consts`] | Shared numeric constants (zoom limits, stroke widths) |

pub mod consts;
pub mod input;
pub mod surface;
pub mod transform;
pub mod zoom;
