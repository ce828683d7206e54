//! # Protocol Layer
//!
//! Outbound batching and inbound dispatch of typed packets.
//!
//! ## Components
//! - **frame**: single and combined frame layouts, combine/split
//! - **queue**: pending packet queue with dedup, threshold and periodic flush
//! - **dispatcher**: routes received packets to per-type handlers
//!
//! ## Flow
//! ```text
//! ByteBuffer -> QueueBuffer::enqueue -> flush -> [mask] -> Transport::send
//! FrameReceiver -> [unmask] -> Dispatcher::receive -> split -> read_fields -> handler
//! ```

pub mod dispatcher;
pub mod frame;
pub mod queue;
