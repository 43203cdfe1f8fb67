//! Event-type tags and the dispatch table that routes frames to handlers.
//!
//! DESIGN
//! ======
//! Tags arrive as strings on the wire. They are parsed once into
//! [`EventKind`] so the table is keyed by a typed tag; unknown strings become
//! [`EventKind::Other`] and can still be bound explicitly. A frame whose tag has
//! no handler is counted and logged, never raised.

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use frames::Frame;
use serde_json::Value;

/// Handler invoked with the payload of a matching frame.
pub type Handler = Box<dyn FnMut(&Value)>;

/// Event-type tag of an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    TopoSnapshot,
    TopoUpdate,
    ShowSummary,
    HideSummary,
    AddInstance,
    UpdateInstance,
    RemoveInstance,
    AddDevice,
    UpdateDevice,
    RemoveDevice,
    AddLink,
    UpdateLink,
    RemoveLink,
    AddHost,
    UpdateHost,
    RemoveHost,
    /// Any tag without a dedicated variant.
    Other(String),
}

const KNOWN: &[(&str, EventKind)] = &[
    ("topo.snapshot", EventKind::TopoSnapshot),
    ("topo.update", EventKind::TopoUpdate),
    ("showSummary", EventKind::ShowSummary),
    ("hideSummary", EventKind::HideSummary),
    ("addInstance", EventKind::AddInstance),
    ("updateInstance", EventKind::UpdateInstance),
    ("removeInstance", EventKind::RemoveInstance),
    ("addDevice", EventKind::AddDevice),
    ("updateDevice", EventKind::UpdateDevice),
    ("removeDevice", EventKind::RemoveDevice),
    ("addLink", EventKind::AddLink),
    ("updateLink", EventKind::UpdateLink),
    ("removeLink", EventKind::RemoveLink),
    ("addHost", EventKind::AddHost),
    ("updateHost", EventKind::UpdateHost),
    ("removeHost", EventKind::RemoveHost),
];

impl EventKind {
    /// Parse a wire tag. Never fails: unknown tags map to [`EventKind::Other`].
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        KNOWN
            .iter()
            .find(|(name, _)| *name == tag)
            .map_or_else(|| Self::Other(tag.to_owned()), |(_, kind)| kind.clone())
    }

    /// The wire tag for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Other(tag) => tag.as_str(),
            known => KNOWN
                .iter()
                .find(|(_, kind)| kind == known)
                .map_or("", |(name, _)| *name),
        }
    }

    /// Whether this tag has a dedicated variant.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from event kind to handler, built before binding.
#[derive(Default)]
pub struct DispatchTable {
    handlers: HashMap<EventKind, Handler>,
}

impl DispatchTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any earlier registration.
    #[must_use]
    pub fn on(mut self, kind: EventKind, handler: impl FnMut(&Value) + 'static) -> Self {
        self.insert(kind, handler);
        self
    }

    pub fn insert(&mut self, kind: EventKind, handler: impl FnMut(&Value) + 'static) {
        self.handlers.insert(kind, Box::new(handler));
    }

    #[must_use]
    pub fn contains(&self, kind: &EventKind) -> bool {
        self.handlers.contains_key(kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = self.handlers.keys().cloned().collect();
        kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        kinds
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable").field("kinds", &self.kinds()).finish()
    }
}

#[derive(Debug, Default)]
struct DispatchStats {
    dispatched: Cell<u64>,
    dropped: Cell<u64>,
}

impl DispatchStats {
    fn bump(counter: &Cell<u64>) {
        counter.set(counter.get().saturating_add(1));
    }
}

/// A bound dispatch table owned by an event channel.
pub struct Dispatcher {
    table: DispatchTable,
    stats: Rc<DispatchStats>,
}

impl Dispatcher {
    /// Bind `table`, returning the dispatcher and an observer handle.
    #[must_use]
    pub fn bind(table: DispatchTable) -> (Self, DispatcherHandle) {
        let stats = Rc::new(DispatchStats::default());
        let handle = DispatcherHandle { kinds: table.kinds(), stats: Rc::clone(&stats) };
        (Self { table, stats }, handle)
    }

    /// Route a frame to its handler. Returns `false` if the frame was dropped.
    pub fn dispatch(&mut self, frame: &Frame) -> bool {
        let kind = EventKind::parse(&frame.event);
        match self.table.handlers.get_mut(&kind) {
            Some(handler) => {
                handler(&frame.payload);
                DispatchStats::bump(&self.stats.dispatched);
                true
            }
            None => {
                tracing::warn!(event = %frame.event, sid = ?frame.sid, "no handler for topo event; dropped");
                DispatchStats::bump(&self.stats.dropped);
                false
            }
        }
    }
}

/// Observer for a bound dispatcher: which kinds it routes and what it did.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    kinds: Vec<EventKind>,
    stats: Rc<DispatchStats>,
}

impl DispatcherHandle {
    #[must_use]
    pub fn handles(&self, kind: &EventKind) -> bool {
        self.kinds.contains(kind)
    }

    #[must_use]
    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    /// Frames delivered to a handler.
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.stats.dispatched.get()
    }

    /// Frames discarded for lack of a handler.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.stats.dropped.get()
    }
}
