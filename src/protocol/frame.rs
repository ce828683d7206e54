//! # Frame Format
//!
//! A frame is one unit handed to the transport. It carries either a single
//! packet or several packets combined under a reserved packet type.
//!
//! ## Wire Format
//! ```text
//! single:    [type(1)][payload(N)]
//! combined:  [combined_type(1)] ( [type(1)][payload(N)][FE FE FE FE] )*
//! ```
//!
//! The delimiter is a sentinel, not a length prefix. A payload that contains
//! four consecutive `0xFE` bytes, or that ends in `0xFE`, cannot be split back
//! out of a combined frame correctly; [`is_combinable`] reports this.

use crate::core::buffer::ByteBuffer;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::queue::QueueItem;
use crate::utils::metrics::global_metrics;
use tracing::warn;

/// Byte repeated to mark the end of a combined item
pub const END_OF_PACKET_BYTE: u8 = 0xFE;

/// How many times the end byte is repeated
pub const END_REPEAT: usize = 4;

/// Item delimiter inside combined frames
pub const DELIMITER: [u8; END_REPEAT] = [END_OF_PACKET_BYTE; END_REPEAT];

/// Build a single-packet frame: type byte followed by the payload
pub fn encode_frame(packet_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(1 + payload.len());
    frame.push(packet_type);
    frame.extend_from_slice(payload);
    frame
}

/// Separate the outer type byte from the rest of a received frame
pub fn decode_frame(frame: &[u8]) -> Result<(u8, ByteBuffer)> {
    match frame.split_first() {
        Some((&packet_type, payload)) => {
            let mut buffer = ByteBuffer::from_bytes(payload.to_vec());
            buffer.set_packet_type(packet_type);
            Ok((packet_type, buffer))
        }
        None => Err(ProtocolError::MalformedFrame(
            constants::ERR_EMPTY_FRAME.to_string(),
        )),
    }
}

/// Whether a payload survives a combine/split round trip
pub fn is_combinable(payload: &[u8]) -> bool {
    payload.last() != Some(&END_OF_PACKET_BYTE)
        && !payload.windows(END_REPEAT).any(|w| w == DELIMITER)
}

/// Concatenate queued items into the body of a combined frame.
///
/// The result does not include the outer combined type byte.
pub fn combine(items: &[QueueItem]) -> ByteBuffer {
    let size: usize = items
        .iter()
        .map(|item| 1 + item.buffer.len() + END_REPEAT)
        .sum();

    let mut combined = ByteBuffer::with_capacity(size);
    for item in items {
        combined.put_byte(item.packet_type);
        combined.put_slice(item.buffer.as_slice());
        combined.put_slice(&DELIMITER);
    }
    combined
}

/// Split a received combined frame into its items.
///
/// `frame` is the whole frame as received; byte 0 is the outer combined type
/// and is skipped. Each returned buffer starts with the item's own type byte.
/// Bytes after the last delimiter are returned as a final item and reported
/// as a malformed frame.
pub fn split(frame: &[u8]) -> Vec<ByteBuffer> {
    let mut segments = Vec::new();
    let mut start = 1;
    let mut i = 1;

    while i + END_REPEAT <= frame.len() {
        if frame[i..i + END_REPEAT] == DELIMITER {
            if i > start {
                segments.push(ByteBuffer::from_bytes(&frame[start..i]));
            }
            start = i + END_REPEAT;
            i = start;
        } else {
            i += 1;
        }
    }

    if start < frame.len() {
        global_metrics().malformed_frame();
        warn!(
            tail_len = frame.len() - start,
            frame_len = frame.len(),
            "{}",
            ProtocolError::MalformedFrame(constants::ERR_UNTERMINATED_SEGMENT.to_string())
        );
        segments.push(ByteBuffer::from_bytes(&frame[start..]));
    }

    segments
}

/// Split a combined frame into `(packet_type, payload)` pairs
pub fn split_items(frame: &[u8]) -> Vec<(u8, ByteBuffer)> {
    split(frame)
        .into_iter()
        .filter_map(|segment| decode_frame(segment.as_slice()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(packet_type: u8, payload: &[u8]) -> QueueItem {
        QueueItem::new(packet_type, ByteBuffer::from_bytes(payload.to_vec()))
    }

    #[test]
    fn test_single_frame_layout() {
        assert_eq!(encode_frame(9, &[1, 2]), vec![9, 1, 2]);
        let (packet_type, payload) = decode_frame(&[9, 1, 2]).unwrap();
        assert_eq!(packet_type, 9);
        assert_eq!(payload.as_slice(), &[1, 2]);
        assert_eq!(payload.packet_type(), 9);
    }

    #[test]
    fn test_empty_frame_is_malformed() {
        assert!(matches!(
            decode_frame(&[]),
            Err(ProtocolError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_combine_layout() {
        let combined = combine(&[item(1, &[0xAA]), item(2, &[0xBB, 0xCC])]);
        assert_eq!(
            combined.as_slice(),
            &[1, 0xAA, 0xFE, 0xFE, 0xFE, 0xFE, 2, 0xBB, 0xCC, 0xFE, 0xFE, 0xFE, 0xFE]
        );
    }

    #[test]
    fn test_split_reverses_combine() {
        let items = vec![item(1, b"alpha"), item(7, &[]), item(3, &[0xFE, 0x00, 0x01])];
        let frame = encode_frame(0xFF, combine(&items).as_slice());

        let pieces = split_items(&frame);
        assert_eq!(pieces.len(), 3);
        for ((packet_type, payload), original) in pieces.iter().zip(&items) {
            assert_eq!(*packet_type, original.packet_type);
            assert_eq!(payload.as_slice(), original.buffer.as_slice());
        }
    }

    #[test]
    fn test_split_emits_unterminated_tail() {
        let mut frame = vec![0xFF, 1, 0xAA];
        frame.extend_from_slice(&DELIMITER);
        frame.extend_from_slice(&[2, 0xBB]);

        let segments = split(&frame);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].as_slice(), &[1, 0xAA]);
        assert_eq!(segments[1].as_slice(), &[2, 0xBB]);
    }

    #[test]
    fn test_split_skips_empty_segments() {
        let mut frame = vec![0xFF];
        frame.extend_from_slice(&DELIMITER);
        frame.extend_from_slice(&[4, 1]);
        frame.extend_from_slice(&DELIMITER);
        let segments = split(&frame);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].as_slice(), &[4, 1]);
    }

    #[test]
    fn test_split_tiny_frames() {
        assert!(split(&[]).is_empty());
        assert!(split(&[0xFF]).is_empty());
        assert_eq!(split(&[0xFF, 5]).len(), 1);
    }

    #[test]
    fn test_combinable_payloads() {
        assert!(is_combinable(&[]));
        assert!(is_combinable(&[0xFE, 0xFE, 0xFE, 0x00]));
        assert!(!is_combinable(&[0x00, 0xFE, 0xFE, 0xFE, 0xFE, 0x00]));
        assert!(!is_combinable(&[0x01, 0xFE]));
    }
}
