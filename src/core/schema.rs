//! # Field Schemas
//!
//! A [`Schema`] is the ordered field list shared by the sender and the receiver
//! of one packet kind. Insertion order is wire order; both codec directions walk
//! the same list.
//!
//! Type tokens come from a fixed vocabulary:
//!
//! | Token | Kind | Wire size |
//! |---|---|---|
//! | `id` | [`FieldKind::Id`] | 4 |
//! | `int32`, `int` | [`FieldKind::Int32`] | 4 |
//! | `uint32`, `uint` | [`FieldKind::UInt32`] | 4 |
//! | `float` | [`FieldKind::Float`] | 4 |
//! | `string`, `str` | [`FieldKind::Text`] | 4 + len |
//! | `byte` | [`FieldKind::Byte`] | 1 |
//! | `bool`, `boolean` | [`FieldKind::Bool`] | 1 |
//! | `vector` | [`FieldKind::Vector`] | 12 |
//! | `rotator` | [`FieldKind::Rotator`] | 12 |
//!
//! Any other token is kept as [`FieldKind::Unknown`] so that a schema from a
//! newer peer still loads; the codec skips such fields.

use std::fmt;

/// Wire type of a schema field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Id,
    Int32,
    UInt32,
    Float,
    Text,
    Byte,
    Bool,
    Vector,
    Rotator,
    /// Unrecognised token, skipped on encode and decode
    Unknown(String),
}

impl FieldKind {
    /// Map a type token to its kind
    pub fn from_token(token: &str) -> Self {
        match token {
            "id" => FieldKind::Id,
            "int32" | "int" => FieldKind::Int32,
            "uint32" | "uint" => FieldKind::UInt32,
            "float" => FieldKind::Float,
            "string" | "str" => FieldKind::Text,
            "byte" => FieldKind::Byte,
            "bool" | "boolean" => FieldKind::Bool,
            "vector" => FieldKind::Vector,
            "rotator" => FieldKind::Rotator,
            other => FieldKind::Unknown(other.to_string()),
        }
    }

    /// Canonical token for this kind
    pub fn token(&self) -> &str {
        match self {
            FieldKind::Id => "id",
            FieldKind::Int32 => "int32",
            FieldKind::UInt32 => "uint32",
            FieldKind::Float => "float",
            FieldKind::Text => "string",
            FieldKind::Byte => "byte",
            FieldKind::Bool => "bool",
            FieldKind::Vector => "vector",
            FieldKind::Rotator => "rotator",
            FieldKind::Unknown(token) => token,
        }
    }

    /// Fixed wire size in bytes, `None` for variable-length or unknown kinds
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            FieldKind::Id | FieldKind::Int32 | FieldKind::UInt32 | FieldKind::Float => Some(4),
            FieldKind::Byte | FieldKind::Bool => Some(1),
            FieldKind::Vector | FieldKind::Rotator => Some(12),
            FieldKind::Text | FieldKind::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FieldKind::Unknown(_))
    }
}

impl From<&str> for FieldKind {
    fn from(token: &str) -> Self {
        FieldKind::from_token(token)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Ordered, uniquely named field list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<(String, FieldKind)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Schema::insert`] taking a type token
    pub fn field(mut self, name: impl Into<String>, token: &str) -> Self {
        self.insert(name, FieldKind::from_token(token));
        self
    }

    /// Append a field. Re-inserting an existing name replaces its kind and
    /// keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, kind: FieldKind) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = kind,
            None => self.fields.push((name, kind)),
        }
    }

    pub fn kind_of(&self, name: &str) -> Option<&FieldKind> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, kind)| kind)
    }

    /// Fields in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), kind))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encoded size when every field is fixed-width
    pub fn fixed_size(&self) -> Option<usize> {
        self.fields
            .iter()
            .filter(|(_, kind)| kind.is_known())
            .map(|(_, kind)| kind.fixed_size())
            .sum()
    }
}

impl<N: Into<String>> FromIterator<(N, FieldKind)> for Schema {
    fn from_iter<I: IntoIterator<Item = (N, FieldKind)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (name, kind) in iter {
            schema.insert(name, kind);
        }
        schema
    }
}

impl<'a, const N: usize> From<[(&'a str, &'a str); N]> for Schema {
    fn from(pairs: [(&'a str, &'a str); N]) -> Self {
        pairs
            .into_iter()
            .map(|(name, token)| (name, FieldKind::from_token(token)))
            .collect()
    }
}
