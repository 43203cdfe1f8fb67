//! Transport seam between an event channel and the server connection.
//!
//! DESIGN
//! ======
//! A [`Connector`] starts one connection attempt per call and hands back a
//! [`Link`] that owns it. The link reports progress through a [`LinkSink`]
//! instead of callbacks: every event is queued on the channel's mpsc receiver
//! and tagged with the generation of the link that produced it. The channel
//! drains that queue on its own task, so handlers never run concurrently and
//! events from an abandoned link can be recognised and discarded.

pub mod ws;

use frames::Frame;
use tokio::sync::mpsc::UnboundedSender;

pub use ws::{WsConnector, WsLink};

/// Transport-level failures reported through a [`LinkSink`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket receive failed: {0}")]
    Receive(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("{0}")]
    Other(String),
}

/// Progress of a single link.
#[derive(Debug)]
pub enum LinkEvent {
    /// The server accepted the connection.
    Connected,
    /// An inbound frame, in delivery order.
    Frame(Frame),
    /// The link failed; no further events follow.
    Failed(TransportError),
    /// The server closed the link cleanly.
    Closed,
}

/// A [`LinkEvent`] stamped with the generation of the link that produced it.
#[derive(Debug)]
pub struct Envelope {
    pub generation: u64,
    pub event: LinkEvent,
}

/// Sending half handed to a link. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LinkSink {
    generation: u64,
    tx: UnboundedSender<Envelope>,
}

impl LinkSink {
    #[must_use]
    pub fn new(generation: u64, tx: UnboundedSender<Envelope>) -> Self {
        Self { generation, tx }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue an event. Returns `false` if the channel has gone away.
    pub fn send(&self, event: LinkEvent) -> bool {
        self.tx.send(Envelope { generation: self.generation, event }).is_ok()
    }

    pub fn connected(&self) -> bool {
        self.send(LinkEvent::Connected)
    }

    pub fn frame(&self, frame: Frame) -> bool {
        self.send(LinkEvent::Frame(frame))
    }

    pub fn failed(&self, error: TransportError) -> bool {
        self.send(LinkEvent::Failed(error))
    }

    pub fn closed(&self) -> bool {
        self.send(LinkEvent::Closed)
    }
}

/// One live (or pending) connection.
pub trait Link {
    /// Release the connection. Must be safe to call more than once.
    fn close(&mut self);
}

/// Factory for links.
pub trait Connector {
    type Link: Link;

    /// Begin connecting. Progress is reported through `sink`.
    fn connect(&mut self, sink: LinkSink) -> Self::Link;
}
