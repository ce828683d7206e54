//! # Structured Field Codec
//!
//! Schema-driven encode/decode of a whole message against a [`ByteBuffer`].
//!
//! Both directions walk the [`Schema`] in insertion order. There is no by-name
//! matching against the wire bytes: field order is the contract.
//!
//! - [`write_fields`] consumes the value list **positionally**: the i-th schema
//!   field takes the i-th value and stops silently when the values run out. The
//!   payload is read with the accessor of the schema's kind, so a value of the
//!   wrong tag writes that kind's zero value rather than failing.
//! - [`read_fields`] aborts on the first underrun.
//! - [`read_fields_lenient`] logs an underrun and stores the zero value for the
//!   field, so a truncated message still yields a complete snapshot.
//!
//! Fields with an unknown type token are skipped in both directions.

use crate::core::buffer::ByteBuffer;
use crate::core::schema::{FieldKind, Schema};
use crate::core::value::{Rotator, Snapshot, TypedValue, Vector3, ZERO_ID};
use crate::error::{ProtocolError, Result};
use crate::utils::metrics::global_metrics;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Write `values` into `buffer` in schema order.
///
/// Only fails when an identifier value carries a token that is not valid
/// base-36; everything written before that field stays in the buffer. An
/// identifier slot holding any other tag writes integer 0.
pub fn write_fields(buffer: &mut ByteBuffer, schema: &Schema, values: &[TypedValue]) -> Result<()> {
    for ((name, kind), value) in schema.iter().zip(values) {
        match kind {
            FieldKind::Id => match value {
                TypedValue::Id(token) => {
                    buffer.put_id(token).map_err(|e| {
                        debug!(field = name, error = %e, "Rejected identifier field");
                        e
                    })?;
                }
                _ => {
                    buffer.put_int32(0);
                }
            },
            FieldKind::Int32 => {
                buffer.put_int32(value.as_int32());
            }
            // uint32 fields share the int32 wire layout
            FieldKind::UInt32 => {
                buffer.put_uint32(value.as_uint32());
            }
            FieldKind::Float => {
                buffer.put_float(value.as_float());
            }
            FieldKind::Text => {
                buffer.put_string(value.as_text());
            }
            FieldKind::Byte => {
                buffer.put_byte(value.as_byte());
            }
            FieldKind::Bool => {
                buffer.put_bool(value.as_bool());
            }
            FieldKind::Vector => {
                buffer.put_vector3(value.as_vector3());
            }
            FieldKind::Rotator => {
                buffer.put_rotator(value.as_rotator());
            }
            FieldKind::Unknown(token) => {
                debug!(field = name, token = %token, "Skipping field with unknown type");
            }
        }
    }

    Ok(())
}

/// Decode one message, failing on the first field that underruns
pub fn read_fields(buffer: &mut ByteBuffer, schema: &Schema, packet_type: u8) -> Result<Snapshot> {
    buffer.set_packet_type(packet_type);
    let mut fields = HashMap::with_capacity(schema.len());

    for (name, kind) in schema.iter() {
        match read_field(buffer, kind) {
            Ok(Some(value)) => {
                fields.insert(name.to_string(), value);
            }
            Ok(None) => {}
            Err(e) => {
                global_metrics().decode_underrun();
                return Err(e);
            }
        }
    }

    Ok(Snapshot::new(packet_type, fields))
}

/// Decode one message, substituting zero values for fields that underrun
pub fn read_fields_lenient(buffer: &mut ByteBuffer, schema: &Schema, packet_type: u8) -> Snapshot {
    buffer.set_packet_type(packet_type);
    let mut fields = HashMap::with_capacity(schema.len());

    for (name, kind) in schema.iter() {
        let value = match read_field(buffer, kind) {
            Ok(Some(value)) => value,
            Ok(None) => continue,
            Err(e) => {
                global_metrics().decode_underrun();
                warn!(
                    packet_type,
                    field = name,
                    kind = %kind,
                    position = buffer.position(),
                    length = buffer.len(),
                    error = %e,
                    "Field read past end of packet, using zero value"
                );
                zero_value(kind)
            }
        };
        fields.insert(name.to_string(), value);
    }

    Snapshot::new(packet_type, fields)
}

/// Check that every value is tagged with the kind its schema slot expects.
///
/// [`write_fields`] does not validate; callers that build value lists from
/// untrusted input can run this first.
pub fn check_values(schema: &Schema, values: &[TypedValue]) -> Result<()> {
    for ((name, kind), value) in schema.iter().zip(values) {
        if !kind.is_known() {
            continue;
        }
        if value.kind().as_ref() != Some(kind) {
            return Err(ProtocolError::EncodingMismatch(format!(
                "field '{name}' expects {kind}, got {value:?}"
            )));
        }
    }
    Ok(())
}

fn read_field(buffer: &mut ByteBuffer, kind: &FieldKind) -> Result<Option<TypedValue>> {
    let value = match kind {
        FieldKind::Id => TypedValue::Id(buffer.get_id()?),
        FieldKind::Int32 => TypedValue::Int32(buffer.get_int32()?),
        FieldKind::UInt32 => TypedValue::UInt32(buffer.get_uint32()?),
        FieldKind::Float => TypedValue::Float(buffer.get_float()?),
        FieldKind::Text => TypedValue::Text(buffer.get_string()?),
        FieldKind::Byte => TypedValue::Byte(buffer.get_byte()?),
        FieldKind::Bool => TypedValue::Bool(buffer.get_bool()?),
        FieldKind::Vector => TypedValue::Vector3(buffer.get_vector3()?),
        FieldKind::Rotator => TypedValue::Rotator(buffer.get_rotator()?),
        FieldKind::Unknown(token) => {
            debug!(token = %token, "{}", ProtocolError::EncodingMismatch(token.clone()));
            return Ok(None);
        }
    };
    Ok(Some(value))
}

fn zero_value(kind: &FieldKind) -> TypedValue {
    match kind {
        FieldKind::Id => TypedValue::Id(ZERO_ID.to_string()),
        FieldKind::Int32 => TypedValue::Int32(0),
        FieldKind::UInt32 => TypedValue::UInt32(0),
        FieldKind::Float => TypedValue::Float(0.0),
        FieldKind::Text => TypedValue::Text(String::new()),
        FieldKind::Byte => TypedValue::Byte(0),
        FieldKind::Bool => TypedValue::Bool(false),
        FieldKind::Vector => TypedValue::Vector3(Vector3::ZERO),
        FieldKind::Rotator => TypedValue::Rotator(Rotator::ZERO),
        FieldKind::Unknown(_) => TypedValue::None,
    }
}
