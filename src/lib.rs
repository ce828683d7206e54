//! # netframe
//!
//! Binary message buffers, schema-driven field encoding and batched packet
//! framing for real-time clients.
//!
//! A message is a one-byte packet type followed by a payload written through
//! a [`ByteBuffer`](core::buffer::ByteBuffer). Payload layout is described by
//! a [`Schema`](core::schema::Schema): an ordered list of typed fields that
//! both ends agree on. Outbound packets are collected by a
//! [`QueueBuffer`](protocol::queue::QueueBuffer), deduplicated and sent either
//! alone or combined into one frame separated by `FE FE FE FE`. Frames may be
//! masked with a repeating-key XOR before they reach the
//! [`Transport`](transport::Transport).
//!
//! ## Example
//! ```rust
//! use netframe::core::buffer::ByteBuffer;
//! use netframe::core::codec::{read_fields, write_fields};
//! use netframe::core::schema::Schema;
//! use netframe::core::value::TypedValue;
//!
//! let schema = Schema::new()
//!     .field("id", "id")
//!     .field("hp", "int32")
//!     .field("name", "string");
//!
//! let mut buffer = ByteBuffer::new();
//! write_fields(
//!     &mut buffer,
//!     &schema,
//!     &[TypedValue::id("5"), TypedValue::Int32(42), TypedValue::from("Nova")],
//! )
//! .unwrap();
//!
//! buffer.rewind();
//! let snapshot = read_fields(&mut buffer, &schema, 7).unwrap();
//! assert_eq!(snapshot.get_id("id"), "5");
//! assert_eq!(snapshot.get_int32("hp"), 42);
//! assert_eq!(snapshot.get_string("name"), "Nova");
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::core::buffer::ByteBuffer;
pub use crate::core::schema::{FieldKind, Schema};
pub use crate::core::value::{Rotator, Snapshot, TypedValue, Vector3};
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::dispatcher::Dispatcher;
pub use crate::protocol::queue::{EnqueueOutcome, FlushOutcome, QueueBuffer};
pub use crate::transport::{FrameReceiver, Transport};
