//! Websocket transport built on tokio-tungstenite.

use super::{InboundStream, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Connects to a `ws://` endpoint and yields text frames.
///
/// Built without TLS: any other scheme, `wss` included, is rejected before a
/// socket is opened.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    /// Create a transport for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Reject endpoints this build can never open.
fn check_scheme(url: &str) -> Result<(), TransportError> {
    match url.split_once("://") {
        Some(("ws", _)) => Ok(()),
        Some(("wss", _)) => Err(TransportError::InvalidEndpoint(format!(
            "{url}: TLS support not compiled in"
        ))),
        Some((scheme, _)) => Err(TransportError::InvalidEndpoint(format!(
            "{url}: unsupported scheme '{scheme}'"
        ))),
        None => Err(TransportError::InvalidEndpoint(format!(
            "{url}: missing scheme"
        ))),
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self) -> Result<Box<dyn InboundStream>, TransportError> {
        debug!("opening websocket (url={})", self.url);
        check_scheme(&self.url)?;
        let (socket, response) = connect_async(self.url.as_str())
            .await
            .map_err(classify)?;
        info!(
            "websocket handshake complete (url={}, status={})",
            self.url,
            response.status()
        );
        Ok(Box::new(WebSocketInbound { socket }))
    }

    fn describe(&self) -> String {
        format!("websocket {}", self.url)
    }
}

struct WebSocketInbound {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl InboundStream for WebSocketInbound {
    async fn next_payload(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Ok(Message::Close(frame)) => {
                    debug!("websocket close frame received (frame={:?})", frame);
                    return None;
                }
                // Control frames are answered by tungstenite itself.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(err) => return Some(Err(classify(err))),
            }
        }
    }
}

/// Map tungstenite failures onto transport errors.
fn classify(err: WsError) -> TransportError {
    match err {
        WsError::Url(err) => TransportError::InvalidEndpoint(err.to_string()),
        WsError::Io(err) => TransportError::Io(err),
        WsError::Http(response) => {
            TransportError::Handshake(format!("server responded with {}", response.status()))
        }
        WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
        other => TransportError::Protocol(other.to_string()),
    }
}
