//! # topoview
//!
//! Topology view controller: a pan/zoom transform over a rendering surface,
//! plus a live event channel that keeps an in-memory topology model in step
//! with a server-pushed stream of topology events.
//!
//! The view itself is host-agnostic. Rendering, key bindings, glyphs, maps
//! and floating panels are collaborator traits in [`services`]; the
//! [`headless`] module implements them in memory so the `topoview` binary
//! and the tests can drive a complete view without a browser.

pub mod channel;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod headless;
pub mod reconnect;
pub mod services;
pub mod topo;
pub mod transport;
pub mod view;
