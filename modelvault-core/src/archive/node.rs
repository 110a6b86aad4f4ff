//! In-memory object graph and the keyed coding capability
//!
//! Objects never see `PrimitiveValue`. They write their fields into a
//! [`KeyedEncoder`] and read them back from a [`KeyedDecoder`]; both hold
//! [`Node`] values, where child objects stay as shared `Arc` handles. The
//! archiver walks those nodes in canonical order, which keeps alias indices
//! independent of the order an object happens to write or read its fields.

use super::errors::{ArchiveError, ArchiveResult};
use super::value::PrimitiveValue;
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Type-erasure helpers every archivable object gets for free
pub trait AnyObject: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AnyObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Keyed coding capability
///
/// Implementors must be registered with a [`ClassRegistry`](super::ClassRegistry)
/// before they can be encoded or decoded.
///
/// # Example
/// ```
/// use modelvault_core::{Archivable, ArchiveResult, KeyedDecoder, KeyedEncoder};
///
/// #[derive(Debug)]
/// struct Note {
///     text: String,
/// }
///
/// impl Archivable for Note {
///     fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
///         encoder.encode_str("text", &self.text);
///         Ok(())
///     }
///
///     fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
///         Ok(Note { text: decoder.decode_string("text")? })
///     }
/// }
/// ```
pub trait Archivable: AnyObject + fmt::Debug {
    /// Write every persistent field into `encoder`
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()>;

    /// Build an instance from previously encoded fields
    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self>
    where
        Self: Sized;
}

/// Shared handle to an archivable object
pub type ObjectRef = Arc<dyn Archivable>;

/// Address of the shared allocation; stable while any handle is alive
pub(crate) fn identity_of(obj: &ObjectRef) -> usize {
    Arc::as_ptr(obj) as *const () as usize
}

pub(crate) fn type_id_of(obj: &ObjectRef) -> TypeId {
    (**obj).as_any().type_id()
}

fn downcast_object<T: Archivable>(obj: &ObjectRef) -> ArchiveResult<Arc<T>> {
    let found = (**obj).type_name();
    AnyObject::into_any(Arc::clone(obj))
        .downcast::<T>()
        .map_err(|_| ArchiveError::UnexpectedClass {
            expected: std::any::type_name::<T>().to_string(),
            found: found.to_string(),
        })
}

/// A value in an in-memory object graph
#[derive(Debug, Clone)]
pub enum Node {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Sequence(Vec<Node>),
    Mapping(BTreeMap<String, Node>),
    Object(ObjectRef),
}

impl Node {
    pub fn object<T: Archivable>(obj: &Arc<T>) -> Node {
        Node::Object(Arc::clone(obj) as ObjectRef)
    }

    /// Plain structural copy of a primitive tree; no class tags are interpreted
    pub fn from_primitive(value: &PrimitiveValue) -> Node {
        match value {
            PrimitiveValue::Null => Node::Null,
            PrimitiveValue::Bool(b) => Node::Bool(*b),
            PrimitiveValue::Integer(i) => Node::Integer(*i),
            PrimitiveValue::Float(f) => Node::Float(*f),
            PrimitiveValue::Text(s) => Node::Text(s.clone()),
            PrimitiveValue::Bytes(b) => Node::Bytes(b.clone()),
            PrimitiveValue::Sequence(items) => {
                Node::Sequence(items.iter().map(Node::from_primitive).collect())
            }
            PrimitiveValue::Mapping(map) => Node::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), Node::from_primitive(v)))
                    .collect(),
            ),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "bool",
            Node::Integer(_) => "integer",
            Node::Float(_) => "float",
            Node::Text(_) => "text",
            Node::Bytes(_) => "bytes",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
            Node::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Float(f) => Some(*f),
            Node::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Node::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Node::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Typed view of an object node
    pub fn downcast<T: Archivable>(&self) -> ArchiveResult<Arc<T>> {
        match self {
            Node::Object(obj) => downcast_object(obj),
            other => Err(ArchiveError::UnexpectedClass {
                expected: std::any::type_name::<T>().to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Bool(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Integer(value)
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Float(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value)
    }
}

impl From<Vec<u8>> for Node {
    fn from(value: Vec<u8>) -> Self {
        Node::Bytes(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::Sequence(value)
    }
}

impl From<BTreeMap<String, Node>> for Node {
    fn from(value: BTreeMap<String, Node>) -> Self {
        Node::Mapping(value)
    }
}

impl From<ObjectRef> for Node {
    fn from(value: ObjectRef) -> Self {
        Node::Object(value)
    }
}

impl From<&PrimitiveValue> for Node {
    fn from(value: &PrimitiveValue) -> Self {
        Node::from_primitive(value)
    }
}

/// Field sink handed to [`Archivable::encode_with`]
///
/// Writing the same key twice keeps the last value.
#[derive(Debug, Default)]
pub struct KeyedEncoder {
    fields: BTreeMap<String, Node>,
}

impl KeyedEncoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn encode_node(&mut self, key: &str, value: impl Into<Node>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn encode_bool(&mut self, key: &str, value: bool) {
        self.encode_node(key, value);
    }

    pub fn encode_i64(&mut self, key: &str, value: i64) {
        self.encode_node(key, value);
    }

    pub fn encode_f64(&mut self, key: &str, value: f64) {
        self.encode_node(key, value);
    }

    pub fn encode_str(&mut self, key: &str, value: &str) {
        self.encode_node(key, value);
    }

    pub fn encode_optional_str(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.encode_str(key, value);
        }
    }

    pub fn encode_bytes(&mut self, key: &str, value: &[u8]) {
        self.encode_node(key, value.to_vec());
    }

    pub fn encode_object<T: Archivable>(&mut self, key: &str, obj: &Arc<T>) {
        self.encode_node(key, Node::object(obj));
    }

    pub fn encode_dyn_object(&mut self, key: &str, obj: &ObjectRef) {
        self.encode_node(key, Node::Object(Arc::clone(obj)));
    }

    /// `None` writes nothing
    pub fn encode_optional_object<T: Archivable>(&mut self, key: &str, obj: Option<&Arc<T>>) {
        if let Some(obj) = obj {
            self.encode_object(key, obj);
        }
    }

    pub fn encode_objects<T: Archivable>(&mut self, key: &str, objs: &[Arc<T>]) {
        let items = objs.iter().map(Node::object).collect::<Vec<_>>();
        self.encode_node(key, items);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn into_fields(self) -> BTreeMap<String, Node> {
        self.fields
    }
}

/// Field source handed to [`Archivable::decode_with`]
///
/// Fields may be read in any order and unknown fields are ignored, so newer
/// archives with extra fields still decode with older types.
#[derive(Debug)]
pub struct KeyedDecoder {
    class_name: String,
    fields: BTreeMap<String, Node>,
}

impl KeyedDecoder {
    pub(crate) fn new(class_name: impl Into<String>, fields: BTreeMap<String, Node>) -> Self {
        Self {
            class_name: class_name.into(),
            fields,
        }
    }

    /// Wire name the object was archived under
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn node(&self, key: &str) -> Option<&Node> {
        self.fields.get(key)
    }

    fn required(&self, key: &str) -> ArchiveResult<&Node> {
        self.fields.get(key).ok_or_else(|| {
            ArchiveError::MalformedArchive(format!(
                "`{}` is missing field `{}`",
                self.class_name, key
            ))
        })
    }

    /// Absent and null fields both read as `None`
    fn present(&self, key: &str) -> Option<&Node> {
        self.fields.get(key).filter(|node| !node.is_null())
    }

    fn mismatch(&self, key: &str, expected: &str, found: &Node) -> ArchiveError {
        ArchiveError::MalformedArchive(format!(
            "field `{}` of `{}` should be {}, found {}",
            key,
            self.class_name,
            expected,
            found.kind()
        ))
    }

    pub fn decode_bool(&self, key: &str) -> ArchiveResult<bool> {
        let node = self.required(key)?;
        node.as_bool().ok_or_else(|| self.mismatch(key, "bool", node))
    }

    pub fn decode_optional_bool(&self, key: &str) -> ArchiveResult<Option<bool>> {
        self.present(key)
            .map(|node| node.as_bool().ok_or_else(|| self.mismatch(key, "bool", node)))
            .transpose()
    }

    pub fn decode_i64(&self, key: &str) -> ArchiveResult<i64> {
        let node = self.required(key)?;
        node.as_i64().ok_or_else(|| self.mismatch(key, "integer", node))
    }

    pub fn decode_optional_i64(&self, key: &str) -> ArchiveResult<Option<i64>> {
        self.present(key)
            .map(|node| node.as_i64().ok_or_else(|| self.mismatch(key, "integer", node)))
            .transpose()
    }

    /// Integers are accepted and widened
    pub fn decode_f64(&self, key: &str) -> ArchiveResult<f64> {
        let node = self.required(key)?;
        node.as_f64().ok_or_else(|| self.mismatch(key, "float", node))
    }

    pub fn decode_string(&self, key: &str) -> ArchiveResult<String> {
        let node = self.required(key)?;
        node.as_str()
            .map(str::to_string)
            .ok_or_else(|| self.mismatch(key, "text", node))
    }

    pub fn decode_optional_string(&self, key: &str) -> ArchiveResult<Option<String>> {
        self.present(key)
            .map(|node| {
                node.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.mismatch(key, "text", node))
            })
            .transpose()
    }

    pub fn decode_bytes(&self, key: &str) -> ArchiveResult<Vec<u8>> {
        let node = self.required(key)?;
        node.as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| self.mismatch(key, "bytes", node))
    }

    pub fn decode_object<T: Archivable>(&self, key: &str) -> ArchiveResult<Arc<T>> {
        self.required(key)?.downcast()
    }

    pub fn decode_optional_object<T: Archivable>(&self, key: &str) -> ArchiveResult<Option<Arc<T>>> {
        self.present(key).map(Node::downcast).transpose()
    }

    /// Null entries (objects of unknown classes that were skipped) are dropped
    pub fn decode_objects<T: Archivable>(&self, key: &str) -> ArchiveResult<Vec<Arc<T>>> {
        let node = self.required(key)?;
        let items = node
            .as_sequence()
            .ok_or_else(|| self.mismatch(key, "sequence", node))?;
        items
            .iter()
            .filter(|item| !item.is_null())
            .map(Node::downcast)
            .collect()
    }
}
