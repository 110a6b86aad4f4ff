//! JSON codec, the human-readable reference format
//!
//! Byte strings have no JSON counterpart and travel as `{"$bytes": "<base64>"}`.
//! Integers and floats stay distinct: floats are always written with a
//! fractional part or exponent.

use super::{ArchiveCodec, ArchiveFormat};
use crate::archive::{ArchiveError, ArchiveResult, PrimitiveValue};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Number, Value};

/// Reserved key wrapping base64 byte strings
pub const BYTES_KEY: &str = "$bytes";

/// Deepest container nesting serde_json will parse back
///
/// Its reader refuses the 128th nested array or object, so encode stops here
/// rather than write a file nothing can read.
pub const MAX_JSON_DEPTH: usize = 127;

#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Pretty-printed output
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn to_json(value: &PrimitiveValue) -> ArchiveResult<Value> {
        Ok(match value {
            PrimitiveValue::Null => Value::Null,
            PrimitiveValue::Bool(b) => Value::Bool(*b),
            PrimitiveValue::Integer(i) => Value::Number((*i).into()),
            PrimitiveValue::Float(f) => Value::Number(Number::from_f64(*f).ok_or_else(|| {
                ArchiveError::UnsupportedValue(format!("non-finite float {}", f))
            })?),
            PrimitiveValue::Text(s) => Value::String(s.clone()),
            PrimitiveValue::Bytes(bytes) => {
                let mut map = Map::new();
                map.insert(BYTES_KEY.to_string(), Value::String(STANDARD.encode(bytes)));
                Value::Object(map)
            }
            PrimitiveValue::Sequence(items) => Value::Array(
                items
                    .iter()
                    .map(Self::to_json)
                    .collect::<ArchiveResult<_>>()?,
            ),
            PrimitiveValue::Mapping(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| Ok((key.clone(), Self::to_json(value)?)))
                    .collect::<ArchiveResult<_>>()?,
            ),
        })
    }

    pub fn from_json(value: &Value) -> ArchiveResult<PrimitiveValue> {
        Ok(match value {
            Value::Null => PrimitiveValue::Null,
            Value::Bool(b) => PrimitiveValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PrimitiveValue::Integer(i),
                None => PrimitiveValue::Float(n.as_f64().ok_or_else(|| {
                    ArchiveError::MalformedArchive(format!("unrepresentable number {}", n))
                })?),
            },
            Value::String(s) => PrimitiveValue::Text(s.clone()),
            Value::Array(items) => PrimitiveValue::Sequence(
                items
                    .iter()
                    .map(Self::from_json)
                    .collect::<ArchiveResult<_>>()?,
            ),
            Value::Object(map) => match (map.len(), map.get(BYTES_KEY)) {
                (1, Some(encoded)) => {
                    let encoded = encoded.as_str().ok_or_else(|| {
                        ArchiveError::MalformedArchive(format!("`{}` should be a string", BYTES_KEY))
                    })?;
                    PrimitiveValue::Bytes(STANDARD.decode(encoded).map_err(|e| {
                        ArchiveError::MalformedArchive(format!("invalid base64: {}", e))
                    })?)
                }
                _ => PrimitiveValue::Mapping(
                    map.iter()
                        .map(|(key, value)| Ok((key.clone(), Self::from_json(value)?)))
                        .collect::<ArchiveResult<_>>()?,
                ),
            },
        })
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveCodec for JsonCodec {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Json
    }

    fn encode(&self, value: &PrimitiveValue) -> ArchiveResult<Vec<u8>> {
        let json = Self::to_json(value)?;
        let depth = nesting_depth(&json);
        if depth > MAX_JSON_DEPTH {
            return Err(ArchiveError::UnsupportedValue(format!(
                "JSON output nests {} levels, more than the {} the format can read back",
                depth, MAX_JSON_DEPTH
            )));
        }
        Ok(if self.pretty {
            serde_json::to_vec_pretty(&json)?
        } else {
            serde_json::to_vec(&json)?
        })
    }

    fn decode(&self, bytes: &[u8]) -> ArchiveResult<PrimitiveValue> {
        let json: Value = serde_json::from_slice(bytes)?;
        Self::from_json(&json)
    }
}

fn nesting_depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(nesting_depth).max().unwrap_or(0),
        Value::Object(map) => 1 + map.values().map(nesting_depth).max().unwrap_or(0),
        _ => 0,
    }
}
