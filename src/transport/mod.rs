//! # Transport Layer
//!
//! The protocol core only needs two things from a connection: a fire-and-forget
//! `send` for whole frames and a channel that yields inbound frames one at a
//! time. [`Transport`] is the outbound half; [`FrameReceiver`] is the inbound
//! half.
//!
//! ## Implementations
//! - [`channel::ChannelTransport`]: in-memory loopback over a tokio channel
//! - [`stream::StreamTransport`]: any async byte stream (TCP, duplex pipe)
//!   framed with a length-delimited codec
//!
//! There is no acknowledgement or retry: a frame whose send fails is lost.

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::Result;

pub mod channel;
pub mod stream;

pub use channel::ChannelTransport;
pub use stream::StreamTransport;

/// Outbound half of a connection
pub trait Transport: Send + Sync {
    /// Hand one frame to the connection
    fn send(&self, frame: Vec<u8>) -> Result<()>;

    /// Whether frames can currently be sent
    fn is_connected(&self) -> bool {
        true
    }
}

/// Inbound half of a connection: one reassembled frame per item
#[derive(Debug)]
pub struct FrameReceiver {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl FrameReceiver {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self { rx }
    }

    /// Wait for the next frame; `None` once the connection is gone
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Take a frame if one is already waiting
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Drain every frame that is already waiting
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn into_stream(self) -> UnboundedReceiverStream<Vec<u8>> {
        UnboundedReceiverStream::new(self.rx)
    }
}
