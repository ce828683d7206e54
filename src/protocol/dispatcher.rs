use crate::config::{BatchConfig, DEFAULT_COMBINED_PACKET_TYPE};
use crate::core::buffer::ByteBuffer;
use crate::core::codec::read_fields_lenient;
use crate::core::schema::Schema;
use crate::core::value::Snapshot;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::frame::{decode_frame, split};
use crate::transport::FrameReceiver;
use crate::utils::cipher::obfuscate;
use crate::utils::metrics::{global_metrics, Timer};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

type HandlerFn = dyn Fn(&Snapshot) -> Result<()> + Send + Sync + 'static;

struct Route {
    schema: Schema,
    handler: Box<HandlerFn>,
}

/// Inbound packet router.
/// Each packet type maps to the schema its payload is decoded with and the
/// handler that receives the decoded snapshot.
pub struct Dispatcher {
    routes: Arc<RwLock<HashMap<u8, Route>>>,
    combined_packet_type: u8,
    cipher_key: String,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            combined_packet_type: DEFAULT_COMBINED_PACKET_TYPE,
            cipher_key: String::new(),
        }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            combined_packet_type: config.combined_packet_type,
            cipher_key: config.cipher_key.clone(),
        }
    }

    pub fn register<F>(&self, packet_type: u8, schema: Schema, handler: F) -> Result<()>
    where
        F: Fn(&Snapshot) -> Result<()> + Send + Sync + 'static,
    {
        if packet_type == self.combined_packet_type {
            return Err(ProtocolError::ReservedPacketType(packet_type));
        }

        let mut routes = self.routes.write().map_err(|_| {
            ProtocolError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string())
        })?;

        routes.insert(
            packet_type,
            Route {
                schema,
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    pub fn unregister(&self, packet_type: u8) -> Result<bool> {
        let mut routes = self.routes.write().map_err(|_| {
            ProtocolError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string())
        })?;
        Ok(routes.remove(&packet_type).is_some())
    }

    pub fn is_registered(&self, packet_type: u8) -> bool {
        self.routes
            .read()
            .map(|routes| routes.contains_key(&packet_type))
            .unwrap_or(false)
    }

    /// Handle one frame as it came off the transport.
    ///
    /// Combined frames are split and every item is routed; an item that fails
    /// is logged and skipped. A single-packet frame returns its routing error.
    /// Returns how many packets reached a handler.
    #[instrument(skip(self, raw), fields(len = raw.len()))]
    pub fn receive(&self, raw: &[u8]) -> Result<usize> {
        let _timer = Timer::start("dispatch_frame");
        let frame = if self.cipher_key.is_empty() {
            raw.to_vec()
        } else {
            obfuscate(raw, &self.cipher_key)
        };

        let (packet_type, payload) = decode_frame(&frame)?;
        if packet_type != self.combined_packet_type {
            self.route(packet_type, payload)?;
            return Ok(1);
        }

        let mut delivered = 0;
        for segment in split(&frame) {
            let (item_type, item) = decode_frame(segment.as_slice())?;
            match self.route(item_type, item) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(packet_type = item_type, error = %e, "Dropping combined item"),
            }
        }
        debug!(delivered, "Combined frame dispatched");
        Ok(delivered)
    }

    /// Decode `payload` with the schema registered for `packet_type` and run
    /// its handler.
    pub fn route(&self, packet_type: u8, mut payload: ByteBuffer) -> Result<()> {
        let routes = self.routes.read().map_err(|_| {
            ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string())
        })?;

        let route = routes
            .get(&packet_type)
            .ok_or(ProtocolError::UnexpectedPacket(packet_type))?;

        let snapshot = read_fields_lenient(&mut payload, &route.schema, packet_type);
        (route.handler)(&snapshot)?;
        global_metrics().packet_delivered();
        Ok(())
    }
}

/// Feed every frame from `frames` into `dispatcher` until the connection ends
pub fn spawn_receiver(dispatcher: Arc<Dispatcher>, mut frames: FrameReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if let Err(e) = dispatcher.receive(&frame) {
                warn!(error = %e, len = frame.len(), "Dropping inbound frame");
            }
        }
        debug!("Frame receiver closed");
    })
}
