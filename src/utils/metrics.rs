//! Observability and Metrics
//!
//! Counters for the batching queue, frame splitting and the field codec.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Global metrics collector for protocol operations
#[derive(Debug)]
pub struct Metrics {
    /// Packets accepted into a pending queue
    pub packets_queued: AtomicU64,
    /// Packets dropped because identical content was already pending
    pub duplicates_dropped: AtomicU64,
    /// Packets dropped for using the reserved combined-frame type
    pub reserved_dropped: AtomicU64,
    /// Frames handed to a transport
    pub frames_sent: AtomicU64,
    /// Frames that carried several combined packets
    pub combined_frames_sent: AtomicU64,
    /// Total bytes handed to a transport
    pub bytes_sent: AtomicU64,
    /// Frames whose send failed
    pub send_failures: AtomicU64,
    /// Frames received from a transport
    pub frames_received: AtomicU64,
    /// Total bytes received from a transport
    pub bytes_received: AtomicU64,
    /// Packets delivered to a handler
    pub packets_delivered: AtomicU64,
    /// Combined frames with an unterminated tail
    pub malformed_frames: AtomicU64,
    /// Field reads that ran past the end of a packet
    pub decode_underruns: AtomicU64,
    /// Cipher calls made with an empty key
    pub cipher_key_missing: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            packets_queued: AtomicU64::new(0),
            duplicates_dropped: AtomicU64::new(0),
            reserved_dropped: AtomicU64::new(0),
            frames_sent: AtomicU64::new(0),
            combined_frames_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            packets_delivered: AtomicU64::new(0),
            malformed_frames: AtomicU64::new(0),
            decode_underruns: AtomicU64::new(0),
            cipher_key_missing: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn packet_queued(&self) {
        self.packets_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate_dropped(&self) {
        self.duplicates_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reserved_dropped(&self) {
        self.reserved_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame handed to the transport
    pub fn frame_sent(&self, byte_count: u64, combined: bool) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
        if combined {
            self.combined_frames_sent.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn send_failed(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame received from the transport
    pub fn frame_received(&self, byte_count: u64) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn packet_delivered(&self) {
        self.packets_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn malformed_frame(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_underrun(&self) {
        self.decode_underruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cipher_key_missing(&self) {
        self.cipher_key_missing.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_queued: self.packets_queued.load(Ordering::Relaxed),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::Relaxed),
            reserved_dropped: self.reserved_dropped.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            combined_frames_sent: self.combined_frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            packets_delivered: self.packets_delivered.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            decode_underruns: self.decode_underruns.load(Ordering::Relaxed),
            cipher_key_missing: self.cipher_key_missing.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            packets_queued = snapshot.packets_queued,
            duplicates_dropped = snapshot.duplicates_dropped,
            reserved_dropped = snapshot.reserved_dropped,
            frames_sent = snapshot.frames_sent,
            combined_frames_sent = snapshot.combined_frames_sent,
            bytes_sent = snapshot.bytes_sent,
            send_failures = snapshot.send_failures,
            frames_received = snapshot.frames_received,
            bytes_received = snapshot.bytes_received,
            packets_delivered = snapshot.packets_delivered,
            malformed_frames = snapshot.malformed_frames,
            decode_underruns = snapshot.decode_underruns,
            cipher_key_missing = snapshot.cipher_key_missing,
            uptime_seconds = snapshot.uptime_seconds,
            "Protocol metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub packets_queued: u64,
    pub duplicates_dropped: u64,
    pub reserved_dropped: u64,
    pub frames_sent: u64,
    pub combined_frames_sent: u64,
    pub bytes_sent: u64,
    pub send_failures: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    pub packets_delivered: u64,
    pub malformed_frames: u64,
    pub decode_underruns: u64,
    pub cipher_key_missing: u64,
    pub uptime_seconds: u64,
}

/// Global metrics instance (lazy static for simplicity)
static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Initialize metrics collection (call once at startup)
pub fn init_metrics() {
    // Force initialization
    let _ = global_metrics();
    info!("Metrics collection initialized");
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
