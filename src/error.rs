//! # Error Types
//!
//! Error handling for the buffer codec and the batching protocol.
//!
//! None of these errors are fatal to the process. Reads that run past the end
//! of a buffer, unknown schema tokens and malformed combined frames are reported
//! to the caller (or logged by the lenient paths) and only the affected message
//! is dropped or partially decoded.
//!
//! ## Error Categories
//! - **Codec Errors**: buffer underruns, invalid identifiers, invalid base64
//! - **Framing Errors**: malformed frames, reserved or unexpected packet types
//! - **Cipher Errors**: empty obfuscation key
//! - **Transport Errors**: send failures, closed connections, I/O
//! - **Configuration Errors**: unreadable or invalid configuration
//!
//! ## Example Usage
//! ```rust
//! use netframe::core::buffer::ByteBuffer;
//! use netframe::error::ProtocolError;
//! use tracing::{info, warn};
//!
//! let mut buffer = ByteBuffer::from_bytes(vec![0x2A, 0x00]);
//! match buffer.get_int32() {
//!     Ok(value) => info!(value, "Read value"),
//!     Err(ProtocolError::BufferUnderrun { needed, remaining }) => {
//!         warn!(needed, remaining, "Message truncated");
//!     }
//!     Err(e) => warn!(error = %e, "Unexpected error"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Dispatcher-related error messages
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    /// Framing errors
    pub const ERR_EMPTY_FRAME: &str = "Frame is empty, missing packet type byte";
    pub const ERR_UNTERMINATED_SEGMENT: &str = "Combined frame ends without a delimiter";

    /// Transport errors
    pub const ERR_TRANSPORT_CLOSED: &str = "Transport channel closed";
    pub const ERR_NOT_CONNECTED: &str = "Transport is not connected";
    pub const ERR_FRAME_TOO_LARGE: &str = "Frame exceeds the transport frame limit";
}

// ProtocolError is the primary error type for all codec and protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Buffer underrun: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun { needed: usize, remaining: usize },

    #[error("Encoding mismatch: unknown field type '{0}'")]
    EncodingMismatch(String),

    #[error("Cipher key cannot be empty")]
    EmptyCipherKey,

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Invalid base64 text: {0}")]
    InvalidBase64(String),

    #[error("No handler registered for packet type {0}")]
    UnexpectedPacket(u8),

    #[error("Packet type {0} is reserved for combined frames")]
    ReservedPacketType(u8),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl ProtocolError {
    /// Whether the error only affects the message being processed
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ProtocolError::ConnectionClosed | ProtocolError::Io(_) | ProtocolError::ConfigError(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
