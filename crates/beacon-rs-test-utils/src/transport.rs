use async_trait::async_trait;
use beacon_rs_core::{InboundStream, Transport, TransportError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted item on an accepted mock connection.
#[derive(Debug, Clone)]
pub enum MockFrame {
    /// Inbound payload body.
    Payload(String),
    /// Socket failure with the given io error kind.
    Fail(std::io::ErrorKind),
}

/// Scripted result of a single `open` call.
#[derive(Debug, Clone)]
pub enum MockOpen {
    /// Accept and play `frames`; afterwards close cleanly or stay open.
    Accept {
        frames: Vec<MockFrame>,
        hold_open: bool,
    },
    /// Reject the endpoint as unusable.
    InvalidEndpoint,
    /// Reject the handshake.
    Reject(String),
    /// Never complete the handshake.
    Hang,
}

impl MockOpen {
    /// Accept and deliver the given bodies, then keep the connection open.
    pub fn streaming(bodies: &[&str]) -> Self {
        MockOpen::Accept {
            frames: bodies
                .iter()
                .map(|body| MockFrame::Payload((*body).to_string()))
                .collect(),
            hold_open: true,
        }
    }
}

/// Transport that follows a script and counts how often it was opened.
///
/// Once the script runs out every further open hangs.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<MockOpen>>>,
    opens: Arc<AtomicUsize>,
    open_delay: Option<Duration>,
}

impl MockTransport {
    pub fn new(script: impl IntoIterator<Item = MockOpen>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            opens: Arc::new(AtomicUsize::new(0)),
            open_delay: None,
        }
    }

    /// Delay every handshake by `delay` before following the script.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Number of `open` calls observed so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self) -> Result<Box<dyn InboundStream>, TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().pop_front().unwrap_or(MockOpen::Hang);
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        match step {
            MockOpen::Accept { frames, hold_open } => Ok(Box::new(MockInbound {
                frames: frames.into(),
                hold_open,
            })),
            MockOpen::InvalidEndpoint => {
                Err(TransportError::InvalidEndpoint("mock://nowhere".to_string()))
            }
            MockOpen::Reject(reason) => Err(TransportError::Handshake(reason)),
            MockOpen::Hang => std::future::pending().await,
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

struct MockInbound {
    frames: VecDeque<MockFrame>,
    hold_open: bool,
}

#[async_trait]
impl InboundStream for MockInbound {
    async fn next_payload(&mut self) -> Option<Result<String, TransportError>> {
        match self.frames.pop_front() {
            Some(MockFrame::Payload(body)) => Some(Ok(body)),
            Some(MockFrame::Fail(kind)) => Some(Err(TransportError::Io(std::io::Error::new(
                kind,
                "mock socket failure",
            )))),
            None if self.hold_open => std::future::pending().await,
            None => None,
        }
    }
}
