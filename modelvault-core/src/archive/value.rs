//! Format-neutral value tree
//!
//! Every codec reads and writes `PrimitiveValue`; the archiver never sees
//! bytes. Mappings are ordered by key so that traversal order is canonical.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tagged union every archive is projected through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Sequence(Vec<PrimitiveValue>),
    Mapping(BTreeMap<String, PrimitiveValue>),
}

impl PrimitiveValue {
    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            PrimitiveValue::Null => "null",
            PrimitiveValue::Bool(_) => "bool",
            PrimitiveValue::Integer(_) => "integer",
            PrimitiveValue::Float(_) => "float",
            PrimitiveValue::Text(_) => "text",
            PrimitiveValue::Bytes(_) => "bytes",
            PrimitiveValue::Sequence(_) => "sequence",
            PrimitiveValue::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PrimitiveValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrimitiveValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrimitiveValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and integers widened to floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PrimitiveValue::Float(f) => Some(*f),
            PrimitiveValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PrimitiveValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[PrimitiveValue]> {
        match self {
            PrimitiveValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, PrimitiveValue>> {
        match self {
            PrimitiveValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a mapping
    pub fn get(&self, key: &str) -> Option<&PrimitiveValue> {
        self.as_mapping().and_then(|map| map.get(key))
    }
}

impl From<bool> for PrimitiveValue {
    fn from(value: bool) -> Self {
        PrimitiveValue::Bool(value)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(value: i64) -> Self {
        PrimitiveValue::Integer(value)
    }
}

impl From<f64> for PrimitiveValue {
    fn from(value: f64) -> Self {
        PrimitiveValue::Float(value)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::Text(value.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        PrimitiveValue::Text(value)
    }
}

impl From<Vec<u8>> for PrimitiveValue {
    fn from(value: Vec<u8>) -> Self {
        PrimitiveValue::Bytes(value)
    }
}

impl From<Vec<PrimitiveValue>> for PrimitiveValue {
    fn from(value: Vec<PrimitiveValue>) -> Self {
        PrimitiveValue::Sequence(value)
    }
}

impl From<BTreeMap<String, PrimitiveValue>> for PrimitiveValue {
    fn from(value: BTreeMap<String, PrimitiveValue>) -> Self {
        PrimitiveValue::Mapping(value)
    }
}
