//! Stream transport.
//!
//! Carries frames over any async byte stream using a length-delimited codec,
//! which restores the message boundaries a stream does not keep. One task
//! writes queued frames, another forwards each inbound frame to the
//! [`FrameReceiver`].
//!
//! ```text
//! [length: u32 BE][frame bytes]
//! ```

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, instrument, warn};

use super::{FrameReceiver, Transport};
use crate::config::TransportConfig;
use crate::error::{constants, ProtocolError, Result};
use crate::utils::metrics::global_metrics;

pub struct StreamTransport {
    tx: mpsc::UnboundedSender<Bytes>,
    connected: Arc<AtomicBool>,
    max_frame_size: usize,
}

impl StreamTransport {
    /// Connect over TCP to the configured address
    #[instrument(skip(config), fields(address = %config.address))]
    pub async fn connect(config: &TransportConfig) -> Result<(Self, FrameReceiver)> {
        let stream = tokio::time::timeout(
            config.connection_timeout,
            TcpStream::connect(&config.address),
        )
        .await
        .map_err(|_| ProtocolError::TransportError("Connection attempt timed out".into()))??;

        stream.set_nodelay(true)?;
        info!("Connected");
        Ok(Self::from_stream(stream, config.max_frame_size))
    }

    /// Wrap an established stream. Must be called inside a tokio runtime.
    pub fn from_stream<S>(stream: S, max_frame_size: usize) -> (Self, FrameReceiver)
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(max_frame_size)
            .new_codec();
        let (mut sink, mut source) = Framed::new(stream, codec).split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Bytes>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let connected = Arc::new(AtomicBool::new(true));

        let writer_flag = connected.clone();
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                let len = frame.len();
                match sink.send(frame).await {
                    Ok(()) => {}
                    // Encoder rejections drop only this frame
                    Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {
                        warn!(error = %e, len, "Skipping frame the codec rejected");
                        global_metrics().send_failed();
                    }
                    Err(e) => {
                        warn!(error = %e, len, "Failed to write frame");
                        global_metrics().send_failed();
                        break;
                    }
                }
            }
            writer_flag.store(false, Ordering::Release);
            let _ = sink.close().await;
            debug!("Stream writer stopped");
        });

        let reader_flag = connected.clone();
        tokio::spawn(async move {
            while let Some(result) = source.next().await {
                match result {
                    Ok(frame) => {
                        global_metrics().frame_received(frame.len() as u64);
                        if in_tx.send(frame.to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read frame");
                        break;
                    }
                }
            }
            reader_flag.store(false, Ordering::Release);
            debug!("Stream reader stopped");
        });

        let transport = Self {
            tx: out_tx,
            connected,
            max_frame_size,
        };
        (transport, FrameReceiver::new(in_rx))
    }
}

impl Transport for StreamTransport {
    fn send(&self, frame: Vec<u8>) -> Result<()> {
        if !self.is_connected() {
            return Err(ProtocolError::ConnectionClosed);
        }
        if frame.len() > self.max_frame_size {
            global_metrics().send_failed();
            return Err(ProtocolError::TransportError(format!(
                "{}: {} bytes (maximum: {})",
                constants::ERR_FRAME_TOO_LARGE,
                frame.len(),
                self.max_frame_size
            )));
        }
        self.tx
            .send(Bytes::from(frame))
            .map_err(|_| ProtocolError::TransportError(constants::ERR_NOT_CONNECTED.into()))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
