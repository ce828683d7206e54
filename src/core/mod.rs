//! # Core Codec Components
//!
//! Binary buffer, typed values and the schema-driven field codec.
//!
//! ## Components
//! - **ByteBuffer**: growable bytes with a read/write cursor and little-endian primitives
//! - **base36**: compact identifier tokens carried as 32-bit integers
//! - **TypedValue / Snapshot**: tagged field values and the decoded field map
//! - **Schema**: ordered field list shared by both ends of a connection
//! - **codec**: encode/decode a whole message against a schema
//!
//! ## Safety
//! - Reads never panic on short input; they report a buffer underrun
//! - String lengths are validated against the remaining bytes before allocation

pub mod base36;
pub mod buffer;
pub mod codec;
pub mod schema;
pub mod value;
