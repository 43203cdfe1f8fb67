//! Event channel: one logical subscription to the server's topology feed.
//!
//! DESIGN
//! ======
//! The channel owns its link and its dispatcher exclusively. Opening starts
//! exactly one link and moves to `Connecting`; the link's `Connected` event
//! moves to `Open`. Frames that beat the connect acknowledgement are buffered
//! and flushed, in arrival order, before anything delivered after it.
//!
//! Every link gets a fresh generation number. Closing (or failing) bumps the
//! generation, so events an abandoned link already queued are recognised as
//! stale and dropped without reaching a handler.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures force `Closed` and are kept in `last_error`; recovering
//! is the owner's call (re-bind if needed, then `open_sock`). Double open and
//! double close are no-ops.

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;

use std::collections::VecDeque;

use frames::Frame;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, trace, warn};

use crate::dispatch::{DispatchTable, Dispatcher, DispatcherHandle};
use crate::transport::{Connector, Envelope, Link, LinkEvent, LinkSink, TransportError};

/// Connection state of an [`EventChannel`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelState {
    #[default]
    Closed,
    Connecting,
    Open,
}

pub struct EventChannel<C: Connector> {
    connector: C,
    state: ChannelState,
    dispatcher: Option<Dispatcher>,
    link: Option<C::Link>,
    generation: u64,
    pending: VecDeque<Frame>,
    last_error: Option<TransportError>,
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
}

impl<C: Connector> EventChannel<C> {
    #[must_use]
    pub fn new(connector: C) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            connector,
            state: ChannelState::Closed,
            dispatcher: None,
            link: None,
            generation: 0,
            pending: VecDeque::new(),
            last_error: None,
            tx,
            rx,
        }
    }

    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// The failure that last forced this channel closed, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Frames waiting for the connect acknowledgement.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Register the dispatch table for this channel.
    ///
    /// Bind once before the first `open_sock`. Binding again replaces the
    /// table, which is how an owner re-binds before recovering.
    pub fn bind_dispatcher(&mut self, table: DispatchTable) -> DispatcherHandle {
        if self.state != ChannelState::Closed {
            warn!(state = ?self.state, "rebinding dispatcher on a live channel");
        } else if self.dispatcher.is_some() {
            debug!("replacing dispatcher");
        }
        let (dispatcher, handle) = Dispatcher::bind(table);
        self.dispatcher = Some(dispatcher);
        handle
    }

    /// Start connecting. No-op unless `Closed`.
    pub fn open_sock(&mut self) {
        if self.state != ChannelState::Closed {
            debug!(state = ?self.state, "open_sock ignored; channel already live");
            return;
        }
        if self.dispatcher.is_none() {
            warn!("opening channel without a bound dispatcher; frames will be dropped");
        }

        self.generation += 1;
        self.pending.clear();
        self.last_error = None;
        let sink = LinkSink::new(self.generation, self.tx.clone());
        self.link = Some(self.connector.connect(sink));
        self.state = ChannelState::Connecting;
        info!(generation = self.generation, "topo event channel connecting");
    }

    /// Close from any state, releasing the link. No-op when already `Closed`.
    pub fn close_sock(&mut self) {
        if self.state == ChannelState::Closed {
            trace!("close_sock ignored; channel already closed");
            return;
        }
        let was = self.state;
        self.release();
        info!(was = ?was, "topo event channel closed");
    }

    /// Handle every event already queued. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            self.handle(envelope);
            handled += 1;
        }
        handled
    }

    /// Wait for the next transport event, handle it, and return the new state.
    pub async fn next_event(&mut self) -> ChannelState {
        if let Some(envelope) = self.rx.recv().await {
            self.handle(envelope);
        }
        self.state
    }

    fn handle(&mut self, envelope: Envelope) {
        if envelope.generation != self.generation || self.state == ChannelState::Closed {
            trace!(generation = envelope.generation, current = self.generation, "dropping stale link event");
            return;
        }

        match envelope.event {
            LinkEvent::Connected => {
                if self.state == ChannelState::Connecting {
                    self.state = ChannelState::Open;
                    info!(buffered = self.pending.len(), "topo event channel open");
                    self.flush_pending();
                }
            }
            LinkEvent::Frame(frame) => match self.state {
                ChannelState::Connecting => self.pending.push_back(frame),
                ChannelState::Open => self.dispatch(&frame),
                ChannelState::Closed => {}
            },
            LinkEvent::Failed(error) => {
                warn!(error = %error, state = ?self.state, "topo event channel failed");
                self.release();
                self.last_error = Some(error);
            }
            LinkEvent::Closed => {
                info!("topo event channel closed by server");
                self.release();
            }
        }
    }

    fn flush_pending(&mut self) {
        while let Some(frame) = self.pending.pop_front() {
            self.dispatch(&frame);
        }
    }

    fn dispatch(&mut self, frame: &Frame) {
        match self.dispatcher.as_mut() {
            Some(dispatcher) => {
                dispatcher.dispatch(frame);
            }
            None => warn!(event = %frame.event, "no dispatcher bound; frame dropped"),
        }
    }

    /// Drop the link, discard buffered frames, retire the generation.
    fn release(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close();
        }
        self.pending.clear();
        self.generation += 1;
        self.state = ChannelState::Closed;
    }
}

impl<C: Connector> Drop for EventChannel<C> {
    fn drop(&mut self) {
        self.close_sock();
    }
}
