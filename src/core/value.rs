//! # Typed Values
//!
//! The closed set of values a schema field can carry, and the immutable
//! [`Snapshot`] produced by a structured decode.
//!
//! Accessors never fail: asking a value (or a snapshot field) for a type it
//! does not hold yields that type's zero value, mirroring how decoded fields
//! are looked up by application code.
//!
//! The identifier zero value is [`ZERO_ID`], the token of integer 0, so a
//! defaulted identifier encodes to the same bytes it decodes from.

use crate::core::schema::FieldKind;
use std::collections::HashMap;

/// Identifier token of the integer 0
pub const ZERO_ID: &str = "0";

/// Three-component vector, written on the wire as X, Y, Z
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Orientation in degrees, written on the wire as Pitch, Yaw, Roll
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// A single tagged field value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypedValue {
    /// Base-36 identifier token
    Id(String),
    Int32(i32),
    UInt32(u32),
    Float(f32),
    Bool(bool),
    Text(String),
    Byte(u8),
    Vector3(Vector3),
    Rotator(Rotator),
    #[default]
    None,
}

impl TypedValue {
    /// Build an identifier value from its base-36 token
    pub fn id(token: impl Into<String>) -> Self {
        TypedValue::Id(token.into())
    }

    /// The schema kind this value would be written as
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            TypedValue::Id(_) => Some(FieldKind::Id),
            TypedValue::Int32(_) => Some(FieldKind::Int32),
            TypedValue::UInt32(_) => Some(FieldKind::UInt32),
            TypedValue::Float(_) => Some(FieldKind::Float),
            TypedValue::Bool(_) => Some(FieldKind::Bool),
            TypedValue::Text(_) => Some(FieldKind::Text),
            TypedValue::Byte(_) => Some(FieldKind::Byte),
            TypedValue::Vector3(_) => Some(FieldKind::Vector),
            TypedValue::Rotator(_) => Some(FieldKind::Rotator),
            TypedValue::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, TypedValue::None)
    }

    pub fn as_id(&self) -> &str {
        match self {
            TypedValue::Id(token) => token,
            _ => ZERO_ID,
        }
    }

    pub fn as_int32(&self) -> i32 {
        match self {
            TypedValue::Int32(v) => *v,
            _ => 0,
        }
    }

    pub fn as_uint32(&self) -> u32 {
        match self {
            TypedValue::UInt32(v) => *v,
            _ => 0,
        }
    }

    pub fn as_float(&self) -> f32 {
        match self {
            TypedValue::Float(v) => *v,
            _ => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            TypedValue::Bool(v) => *v,
            _ => false,
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            TypedValue::Text(v) => v,
            _ => "",
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            TypedValue::Byte(v) => *v,
            _ => 0,
        }
    }

    pub fn as_vector3(&self) -> Vector3 {
        match self {
            TypedValue::Vector3(v) => *v,
            _ => Vector3::ZERO,
        }
    }

    pub fn as_rotator(&self) -> Rotator {
        match self {
            TypedValue::Rotator(v) => *v,
            _ => Rotator::ZERO,
        }
    }
}

impl From<i32> for TypedValue {
    fn from(v: i32) -> Self {
        TypedValue::Int32(v)
    }
}

impl From<u32> for TypedValue {
    fn from(v: u32) -> Self {
        TypedValue::UInt32(v)
    }
}

impl From<f32> for TypedValue {
    fn from(v: f32) -> Self {
        TypedValue::Float(v)
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        TypedValue::Bool(v)
    }
}

impl From<u8> for TypedValue {
    fn from(v: u8) -> Self {
        TypedValue::Byte(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        TypedValue::Text(v.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        TypedValue::Text(v)
    }
}

impl From<Vector3> for TypedValue {
    fn from(v: Vector3) -> Self {
        TypedValue::Vector3(v)
    }
}

impl From<Rotator> for TypedValue {
    fn from(v: Rotator) -> Self {
        TypedValue::Rotator(v)
    }
}

/// Immutable field-name to value map produced by one structured decode
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    packet_type: u8,
    fields: HashMap<String, TypedValue>,
}

impl Snapshot {
    pub(crate) fn new(packet_type: u8, fields: HashMap<String, TypedValue>) -> Self {
        Self {
            packet_type,
            fields,
        }
    }

    /// Packet type this snapshot was decoded for
    pub fn packet_type(&self) -> u8 {
        self.packet_type
    }

    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_id(&self, key: &str) -> String {
        self.get(key)
            .map_or(ZERO_ID, TypedValue::as_id)
            .to_string()
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get(key)
            .map(|v| v.as_text().to_string())
            .unwrap_or_default()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).is_some_and(TypedValue::as_bool)
    }

    pub fn get_int32(&self, key: &str) -> i32 {
        self.get(key).map(TypedValue::as_int32).unwrap_or(0)
    }

    pub fn get_uint32(&self, key: &str) -> u32 {
        self.get(key).map(TypedValue::as_uint32).unwrap_or(0)
    }

    pub fn get_float(&self, key: &str) -> f32 {
        self.get(key).map(TypedValue::as_float).unwrap_or(0.0)
    }

    pub fn get_byte(&self, key: &str) -> u8 {
        self.get(key).map(TypedValue::as_byte).unwrap_or(0)
    }

    pub fn get_vector(&self, key: &str) -> Vector3 {
        self.get(key)
            .map(TypedValue::as_vector3)
            .unwrap_or(Vector3::ZERO)
    }

    pub fn get_rotator(&self, key: &str) -> Rotator {
        self.get(key)
            .map(TypedValue::as_rotator)
            .unwrap_or(Rotator::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_accessor_returns_payload() {
        assert_eq!(TypedValue::Int32(-7).as_int32(), -7);
        assert_eq!(TypedValue::UInt32(7).as_uint32(), 7);
        assert_eq!(TypedValue::id("A1").as_id(), "A1");
        assert_eq!(TypedValue::from("hi").as_text(), "hi");
        assert!(TypedValue::Bool(true).as_bool());
    }

    #[test]
    fn test_mismatched_accessor_returns_zero_value() {
        let value = TypedValue::Text("42".into());
        assert_eq!(value.as_int32(), 0);
        assert_eq!(value.as_id(), ZERO_ID);
        assert_eq!(value.as_float(), 0.0);
        assert_eq!(value.as_vector3(), Vector3::ZERO);
        assert_eq!(TypedValue::None.as_rotator(), Rotator::ZERO);
    }

    #[test]
    fn test_id_and_text_are_distinct_tags() {
        let id = TypedValue::id("5");
        assert_eq!(id.as_text(), "");
        assert_eq!(id.kind(), Some(FieldKind::Id));
        assert_eq!(TypedValue::None.kind(), None);
    }

    #[test]
    fn test_snapshot_lookup() {
        let mut fields = HashMap::new();
        fields.insert("hp".to_string(), TypedValue::Int32(42));
        fields.insert("pos".to_string(), Vector3::new(1.0, 2.0, 3.0).into());
        let snapshot = Snapshot::new(3, fields);

        assert_eq!(snapshot.packet_type(), 3);
        assert_eq!(snapshot.get_int32("hp"), 42);
        assert_eq!(snapshot.get_vector("pos"), Vector3::new(1.0, 2.0, 3.0));
        // wrong tag and missing key both give zero values
        assert_eq!(snapshot.get_string("hp"), "");
        assert_eq!(snapshot.get_int32("missing"), 0);
        assert!(!snapshot.get_bool("missing"));
        assert_eq!(snapshot.get_id("missing"), "0");
        assert_eq!(snapshot.get_id("hp"), "0");
        assert_eq!(snapshot.len(), 2);
    }
}
