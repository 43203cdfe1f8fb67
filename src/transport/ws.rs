//! WebSocket transport over `tokio-tungstenite`.
//!
//! Each link is a spawned task that connects, reports `Connected`, then
//! forwards inbound frames until the server closes or an error occurs. Text
//! messages are JSON frames and binary messages are protobuf frames; anything
//! that fails to decode is logged and skipped so one bad push never stalls the
//! feed. Closing the link aborts the task.

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::{Connector, Link, LinkSink, TransportError};

/// Connects to a fixed WebSocket URL.
///
/// Links run as tokio tasks, so [`Connector::connect`] must be called from
/// within a tokio runtime.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    type Link = WsLink;

    /// Spawn the link task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since the link is started
    /// with `tokio::spawn`.
    fn connect(&mut self, sink: LinkSink) -> WsLink {
        let url = self.url.clone();
        let generation = sink.generation();
        debug!(%url, generation, "spawning websocket link");
        WsLink { task: Some(tokio::spawn(run_link(url, sink))) }
    }
}

/// A spawned WebSocket link. Dropping it aborts the connection.
#[derive(Debug)]
pub struct WsLink {
    task: Option<JoinHandle<()>>,
}

impl Link for WsLink {
    fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_link(url: String, sink: LinkSink) {
    let mut ws = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            sink.failed(TransportError::Connect(Box::new(e)));
            return;
        }
    };

    info!(%url, "websocket connected");
    if !sink.connected() {
        return;
    }

    while let Some(msg) = ws.next().await {
        let decoded = match msg {
            Ok(Message::Text(text)) => frames::decode_text(text.as_str()),
            Ok(Message::Binary(bytes)) => frames::decode_frame(&bytes),
            Ok(Message::Close(reason)) => {
                debug!(?reason, "websocket closed by server");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                sink.failed(TransportError::Receive(Box::new(e)));
                return;
            }
        };

        match decoded {
            Ok(frame) => {
                if !sink.frame(frame) {
                    return;
                }
            }
            Err(e) => warn!(error = %e, "skipping undecodable frame"),
        }
    }

    sink.closed();
}
