//! In-memory transport.
//!
//! Every sent frame is delivered unchanged to the paired [`FrameReceiver`].
//! Useful for loopback setups and for observing exactly what the batching
//! layer puts on the wire.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

use super::{FrameReceiver, Transport};
use crate::error::{constants, ProtocolError, Result};

#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    open: Arc<AtomicBool>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its frames arrive on
    pub fn pair() -> (Self, FrameReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Self {
            tx,
            open: Arc::new(AtomicBool::new(true)),
        };
        (transport, FrameReceiver::new(rx))
    }

    /// Refuse further sends, as if the connection dropped
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

impl Transport for ChannelTransport {
    fn send(&self, frame: Vec<u8>) -> Result<()> {
        if !self.is_connected() {
            return Err(ProtocolError::ConnectionClosed);
        }
        trace!(len = frame.len(), "Channel transport send");
        self.tx
            .send(frame)
            .map_err(|_| ProtocolError::TransportError(constants::ERR_TRANSPORT_CLOSED.into()))
    }

    fn is_connected(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_arrive_in_order() {
        let (transport, mut rx) = ChannelTransport::pair();
        transport.send(vec![1, 2]).unwrap();
        transport.send(vec![3]).unwrap();
        assert_eq!(rx.drain(), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_closed_transport_rejects_send() {
        let (transport, _rx) = ChannelTransport::pair();
        transport.close();
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.send(vec![1]),
            Err(ProtocolError::ConnectionClosed)
        ));
    }

    #[test]
    fn test_dropped_receiver_disconnects() {
        let (transport, rx) = ChannelTransport::pair();
        drop(rx);
        assert!(!transport.is_connected());
        assert!(transport.send(vec![1]).is_err());
    }
}
