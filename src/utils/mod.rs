//! # Utility Modules
//!
//! Supporting utilities for frame obfuscation, logging and metrics.
//!
//! ## Components
//! - **Cipher**: repeating-key byte mask applied to whole frames
//! - **Logging**: tracing-subscriber setup from configuration
//! - **Metrics**: thread-safe counters for queue, frame and codec events

pub mod cipher;
pub mod logging;
pub mod metrics;

pub use cipher::{obfuscate, obfuscate_text, reveal_text};
pub use metrics::global_metrics;
