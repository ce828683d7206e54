//! # Packet Batching
//!
//! [`QueueBuffer`] collects outbound packets and turns them into as few frames
//! as possible. A flush sends a lone packet as-is and combines several packets
//! into one frame under the reserved combined packet type.
//!
//! Flushes happen when the summed pending size reaches the threshold
//! ([`QueueBuffer::check_and_flush`]) or on every periodic tick
//! ([`QueueBuffer::tick`], driven by [`spawn_flush_ticker`]).
//!
//! Delivery is at-most-once: the pending queue is cleared after every send
//! attempt, whether or not the transport accepted the frame.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::config::{BatchConfig, DEFAULT_COMBINED_PACKET_TYPE, MAX_UNCOMBINED_BYTES};
use crate::core::buffer::ByteBuffer;
use crate::error::{ProtocolError, Result};
use crate::protocol::frame::{combine, encode_frame, is_combinable};
use crate::transport::Transport;
use crate::utils::cipher::obfuscate;
use crate::utils::metrics::{global_metrics, Timer};

/// One pending packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub packet_type: u8,
    pub buffer: ByteBuffer,
}

impl QueueItem {
    pub fn new(packet_type: u8, buffer: ByteBuffer) -> Self {
        Self {
            packet_type,
            buffer,
        }
    }
}

/// Result of offering a packet to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// The packet used the combined-frame type and was dropped
    RejectedReserved,
    /// Identical content was already pending and the packet was dropped
    RejectedDuplicate,
}

impl EnqueueOutcome {
    pub fn is_queued(self) -> bool {
        self == EnqueueOutcome::Queued
    }
}

/// What a flush put on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was sent
    Idle,
    /// One packet sent under its own type
    Single,
    /// Several packets sent in one combined frame
    Combined { count: usize },
}

pub struct QueueBuffer {
    items: Vec<QueueItem>,
    combined_packet_type: u8,
    cipher_key: String,
    max_uncombined_bytes: usize,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for QueueBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueBuffer {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            combined_packet_type: DEFAULT_COMBINED_PACKET_TYPE,
            cipher_key: String::new(),
            max_uncombined_bytes: MAX_UNCOMBINED_BYTES,
            transport: None,
        }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            items: Vec::new(),
            combined_packet_type: config.combined_packet_type,
            cipher_key: config.cipher_key.clone(),
            max_uncombined_bytes: config.max_uncombined_bytes,
            transport: None,
        }
    }

    /// Builder-style transport attachment
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn attach_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = Some(transport);
    }

    pub fn detach_transport(&mut self) -> Option<Arc<dyn Transport>> {
        self.transport.take()
    }

    pub fn combined_packet_type(&self) -> u8 {
        self.combined_packet_type
    }

    pub fn set_cipher_key(&mut self, key: impl Into<String>) {
        self.cipher_key = key.into();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    /// Summed payload length of every pending packet
    pub fn pending_bytes(&self) -> usize {
        self.items.iter().map(|item| item.buffer.len()).sum()
    }

    /// Offer a packet for the next flush.
    ///
    /// Packets using the combined type, and packets whose content matches a
    /// pending packet byte for byte, are dropped.
    pub fn enqueue(&mut self, packet_type: u8, buffer: ByteBuffer) -> EnqueueOutcome {
        if packet_type == self.combined_packet_type {
            global_metrics().reserved_dropped();
            warn!("{}", ProtocolError::ReservedPacketType(packet_type));
            return EnqueueOutcome::RejectedReserved;
        }

        if self
            .items
            .iter()
            .any(|item| item.buffer.as_slice() == buffer.as_slice())
        {
            global_metrics().duplicate_dropped();
            warn!(
                packet_type,
                len = buffer.len(),
                "Dropping packet, identical content already pending"
            );
            return EnqueueOutcome::RejectedDuplicate;
        }

        if !is_combinable(buffer.as_slice()) {
            warn!(
                packet_type,
                "Payload contains the item delimiter and will not split cleanly if combined"
            );
        }

        debug!(
            packet_type,
            len = buffer.len(),
            pending = self.items.len() + 1,
            "Queued packet"
        );
        global_metrics().packet_queued();
        self.items.push(QueueItem::new(packet_type, buffer));
        EnqueueOutcome::Queued
    }

    /// Flush if the pending size has reached the threshold
    pub fn check_and_flush(&mut self) -> Result<FlushOutcome> {
        let pending = self.pending_bytes();
        if pending >= self.max_uncombined_bytes {
            debug!(
                pending,
                threshold = self.max_uncombined_bytes,
                "Flush threshold reached"
            );
            self.flush()
        } else {
            Ok(FlushOutcome::Idle)
        }
    }

    /// Enqueue a packet, then flush if the threshold was reached
    pub fn enqueue_and_check(
        &mut self,
        packet_type: u8,
        buffer: ByteBuffer,
    ) -> Result<(EnqueueOutcome, FlushOutcome)> {
        let outcome = self.enqueue(packet_type, buffer);
        let flushed = self.check_and_flush()?;
        Ok((outcome, flushed))
    }

    /// Periodic flush of whatever is pending
    pub fn tick(&mut self) -> Result<FlushOutcome> {
        self.flush()
    }

    /// Send everything pending as one frame.
    ///
    /// Without a transport the queue is kept for a later flush.
    #[instrument(skip(self), fields(pending = self.items.len()))]
    pub fn flush(&mut self) -> Result<FlushOutcome> {
        if self.items.is_empty() {
            return Ok(FlushOutcome::Idle);
        }
        let Some(transport) = self.transport.clone() else {
            debug!("No transport attached, keeping pending packets");
            return Ok(FlushOutcome::Idle);
        };

        let _timer = Timer::start("queue_flush");
        let items = std::mem::take(&mut self.items);
        let (frame, outcome) = match items.as_slice() {
            [item] => (
                encode_frame(item.packet_type, item.buffer.as_slice()),
                FlushOutcome::Single,
            ),
            _ => (
                encode_frame(self.combined_packet_type, combine(&items).as_slice()),
                FlushOutcome::Combined { count: items.len() },
            ),
        };

        let frame = if self.cipher_key.is_empty() {
            frame
        } else {
            obfuscate(&frame, &self.cipher_key)
        };

        let len = frame.len();
        match transport.send(frame) {
            Ok(()) => {
                let combined = matches!(outcome, FlushOutcome::Combined { .. });
                global_metrics().frame_sent(len as u64, combined);
                debug!(?outcome, len, "Flushed");
                Ok(outcome)
            }
            Err(e) => {
                global_metrics().send_failed();
                error!(error = %e, len, dropped = items.len(), "Failed to send frame");
                Err(e)
            }
        }
    }
}

/// Tick `queue` every `interval` until the task is aborted
pub fn spawn_flush_ticker(queue: Arc<Mutex<QueueBuffer>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let mut queue = queue.lock().await;
            if let Err(e) = queue.tick() {
                debug!(error = %e, "Periodic flush failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::{split_items, DELIMITER};
    use crate::transport::{ChannelTransport, FrameReceiver};

    fn queue_with_channel() -> (QueueBuffer, FrameReceiver) {
        let (transport, rx) = ChannelTransport::pair();
        (QueueBuffer::new().with_transport(Arc::new(transport)), rx)
    }

    fn payload(bytes: &[u8]) -> ByteBuffer {
        ByteBuffer::from_bytes(bytes.to_vec())
    }

    #[test]
    fn test_duplicate_content_rejected() {
        let (mut queue, _rx) = queue_with_channel();
        assert_eq!(queue.enqueue(1, payload(&[1, 2])), EnqueueOutcome::Queued);
        assert_eq!(
            queue.enqueue(2, payload(&[1, 2])),
            EnqueueOutcome::RejectedDuplicate
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_duplicate_allowed_after_flush() {
        let (mut queue, mut rx) = queue_with_channel();
        queue.enqueue(1, payload(&[7]));
        queue.flush().unwrap();
        assert!(queue.enqueue(1, payload(&[7])).is_queued());
        assert_eq!(rx.drain().len(), 1);
    }

    #[test]
    fn test_reserved_type_rejected() {
        let (mut queue, _rx) = queue_with_channel();
        assert_eq!(
            queue.enqueue(0xFF, payload(&[1])),
            EnqueueOutcome::RejectedReserved
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_single_item_sent_under_own_type() {
        let (mut queue, mut rx) = queue_with_channel();
        queue.enqueue(9, payload(&[0xAA, 0xBB]));
        assert_eq!(queue.flush().unwrap(), FlushOutcome::Single);
        assert_eq!(rx.drain(), vec![vec![9, 0xAA, 0xBB]]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_several_items_combined() {
        let (mut queue, mut rx) = queue_with_channel();
        queue.enqueue(1, payload(&[0xAA]));
        queue.enqueue(2, payload(&[0xBB]));
        assert_eq!(queue.flush().unwrap(), FlushOutcome::Combined { count: 2 });

        let frames = rx.drain();
        assert_eq!(frames.len(), 1);
        let mut expected = vec![0xFF, 1, 0xAA];
        expected.extend_from_slice(&DELIMITER);
        expected.extend_from_slice(&[2, 0xBB]);
        expected.extend_from_slice(&DELIMITER);
        assert_eq!(frames[0], expected);
        assert_eq!(split_items(&frames[0]).len(), 2);
    }

    #[test]
    fn test_threshold_triggers_one_send() {
        let (transport, mut rx) = ChannelTransport::pair();
        let config = BatchConfig {
            max_uncombined_bytes: 10,
            ..BatchConfig::default()
        };
        let mut queue = QueueBuffer::from_config(&config).with_transport(Arc::new(transport));

        let (_, flushed) = queue.enqueue_and_check(1, payload(&[1; 6])).unwrap();
        assert_eq!(flushed, FlushOutcome::Idle);
        assert!(rx.drain().is_empty());

        let (_, flushed) = queue.enqueue_and_check(2, payload(&[2; 6])).unwrap();
        assert_eq!(flushed, FlushOutcome::Combined { count: 2 });
        assert_eq!(rx.drain().len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_below_threshold_waits_for_tick() {
        let (mut queue, mut rx) = queue_with_channel();
        queue.enqueue(3, payload(&[1, 2, 3]));
        assert_eq!(queue.check_and_flush().unwrap(), FlushOutcome::Idle);
        assert!(rx.drain().is_empty());

        assert_eq!(queue.tick().unwrap(), FlushOutcome::Single);
        assert_eq!(rx.drain().len(), 1);
    }

    #[test]
    fn test_no_transport_keeps_queue() {
        let mut queue = QueueBuffer::new();
        queue.enqueue(1, payload(&[1]));
        assert_eq!(queue.flush().unwrap(), FlushOutcome::Idle);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_empty_flush_is_idle() {
        let (mut queue, mut rx) = queue_with_channel();
        assert_eq!(queue.tick().unwrap(), FlushOutcome::Idle);
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_failed_send_clears_queue() {
        let (transport, _rx) = ChannelTransport::pair();
        transport.close();
        let mut queue = QueueBuffer::new().with_transport(Arc::new(transport));
        queue.enqueue(1, payload(&[1]));
        assert!(matches!(queue.flush(), Err(ProtocolError::ConnectionClosed)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_outbound_frames_are_masked() {
        let (mut queue, mut rx) = queue_with_channel();
        queue.set_cipher_key("k");
        queue.enqueue(1, payload(&[0x00, 0x01]));
        queue.flush().unwrap();

        let k = b'k';
        assert_eq!(rx.drain(), vec![vec![1 ^ k, k, 0x01 ^ k]]);
    }

    #[tokio::test]
    async fn test_ticker_flushes_pending() {
        let (transport, mut rx) = ChannelTransport::pair();
        let queue = Arc::new(Mutex::new(
            QueueBuffer::new().with_transport(Arc::new(transport)),
        ));
        queue.lock().await.enqueue(4, payload(&[4, 4]));

        let handle = spawn_flush_ticker(queue.clone(), Duration::from_millis(50));
        let frame = rx.recv().await;
        handle.abort();

        assert_eq!(frame, Some(vec![4, 4, 4]));
        assert!(queue.lock().await.is_empty());
    }
}
