//! Object graph archiver
//!
//! Converts between [`Node`] graphs and [`PrimitiveValue`] trees.
//!
//! # Canonical traversal (archive format version 1)
//!
//! Both directions walk the graph depth-first in pre-order:
//! - object payload fields and plain mapping entries in ascending byte-wise key order,
//! - sequence elements in index order,
//! - an object's alias index is taken when its node is entered, before its payload.
//!
//! Alias indices are only meaningful under this order. Changing it requires a
//! new [`ARCHIVE_FORMAT_VERSION`].

use super::alias::{DecodeAliasTable, EncodeAliasTable, Visit};
use super::errors::{ArchiveError, ArchiveResult};
use super::node::{Archivable, KeyedDecoder, KeyedEncoder, Node, ObjectRef};
use super::registry::ClassRegistry;
use super::value::PrimitiveValue;
use super::{ALIAS_KEY, CLASS_KEY, PAYLOAD_KEY, RESERVED_PREFIX, ROOT_KEY, VERSION_KEY};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Version written into archive envelopes
pub const ARCHIVE_FORMAT_VERSION: i64 = 1;

/// Deepest nesting accepted in either direction
pub const MAX_NESTING_DEPTH: usize = 256;

/// Decode behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Decode objects of unknown classes as `Null` instead of failing
    pub skip_unknown_classes: bool,
}

/// Encoder/decoder bound to a class registry
#[derive(Debug, Clone, Copy)]
pub struct Archiver<'r> {
    registry: &'r ClassRegistry,
    options: DecodeOptions,
}

impl<'r> Archiver<'r> {
    pub fn new(registry: &'r ClassRegistry) -> Self {
        Self {
            registry,
            options: DecodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &'r ClassRegistry {
        self.registry
    }

    /// Encode a graph into a bare primitive tree
    pub fn encode(&self, root: &Node) -> ArchiveResult<PrimitiveValue> {
        let mut pass = EncodePass {
            registry: self.registry,
            aliases: EncodeAliasTable::new(),
        };
        let value = pass.encode_node(root, 0)?;
        debug!(
            objects = pass.aliases.objects(),
            aliases = pass.aliases.aliases(),
            "encoded object graph"
        );
        Ok(value)
    }

    pub fn encode_object<T: Archivable>(&self, root: &Arc<T>) -> ArchiveResult<PrimitiveValue> {
        self.encode(&Node::object(root))
    }

    /// Decode a bare primitive tree
    ///
    /// Values without a `$class` tag come back as plain structure.
    pub fn decode(&self, value: &PrimitiveValue) -> ArchiveResult<Node> {
        let mut pass = DecodePass {
            registry: self.registry,
            options: self.options,
            aliases: DecodeAliasTable::new(),
        };
        let node = pass.decode_value(value, 0)?;
        debug!(objects = pass.aliases.len(), "decoded object graph");
        Ok(node)
    }

    /// Decode and require the root to be a `T`
    pub fn decode_object<T: Archivable>(&self, value: &PrimitiveValue) -> ArchiveResult<Arc<T>> {
        root_object(value, self.decode(value)?)
    }

    /// Encode and wrap in a versioned envelope
    pub fn archive(&self, root: &Node) -> ArchiveResult<PrimitiveValue> {
        let mut envelope = BTreeMap::new();
        envelope.insert(VERSION_KEY.to_string(), PrimitiveValue::Integer(ARCHIVE_FORMAT_VERSION));
        envelope.insert(ROOT_KEY.to_string(), self.encode(root)?);
        Ok(PrimitiveValue::Mapping(envelope))
    }

    /// Decode an envelope, or a bare tree written without one
    pub fn unarchive(&self, value: &PrimitiveValue) -> ArchiveResult<Node> {
        self.decode(envelope_root(value)?)
    }

    pub fn unarchive_object<T: Archivable>(&self, value: &PrimitiveValue) -> ArchiveResult<Arc<T>> {
        let root = envelope_root(value)?;
        root_object(root, self.decode(root)?)
    }
}

/// A root skipped for its unknown class reports that class, not a `null` mismatch
fn root_object<T: Archivable>(root: &PrimitiveValue, node: Node) -> ArchiveResult<Arc<T>> {
    if let Node::Null = node {
        if let Some(class) = root.get(CLASS_KEY).and_then(PrimitiveValue::as_str) {
            return Err(ArchiveError::UnknownClass(class.to_string()));
        }
    }
    node.downcast()
}

/// Root of an archive, checking the envelope version when there is one
pub fn envelope_root(value: &PrimitiveValue) -> ArchiveResult<&PrimitiveValue> {
    let (Some(version), Some(root)) = (value.get(VERSION_KEY), value.get(ROOT_KEY)) else {
        return Ok(value);
    };
    match version.as_i64() {
        Some(v) if (1..=ARCHIVE_FORMAT_VERSION).contains(&v) => Ok(root),
        Some(v) => Err(ArchiveError::UnsupportedVersion(format!("archive format {}", v))),
        None => Err(ArchiveError::MalformedArchive(format!(
            "envelope version should be integer, found {}",
            version.kind()
        ))),
    }
}

/// Wire name of the root object, if the archive's root is an object node
pub fn declared_root_class(value: &PrimitiveValue) -> Option<&str> {
    envelope_root(value)
        .ok()?
        .get(CLASS_KEY)
        .and_then(PrimitiveValue::as_str)
}

fn check_key(key: &str) -> ArchiveResult<()> {
    if key.starts_with(RESERVED_PREFIX) {
        return Err(ArchiveError::UnsupportedValue(format!(
            "key `{}` uses the reserved `{}` prefix",
            key, RESERVED_PREFIX
        )));
    }
    Ok(())
}

/// Reserved nodes carry their own keys and nothing else
fn check_node_keys(map: &BTreeMap<String, PrimitiveValue>, allowed: &[&str]) -> ArchiveResult<()> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(ArchiveError::MalformedArchive(format!(
            "unexpected key `{}` in `{}` node",
            key, allowed[0]
        ))),
        None => Ok(()),
    }
}

fn alias_node(index: usize) -> PrimitiveValue {
    let mut map = BTreeMap::new();
    map.insert(ALIAS_KEY.to_string(), PrimitiveValue::Integer(index as i64));
    PrimitiveValue::Mapping(map)
}

fn object_node(wire_name: String, payload: BTreeMap<String, PrimitiveValue>) -> PrimitiveValue {
    let mut map = BTreeMap::new();
    map.insert(CLASS_KEY.to_string(), PrimitiveValue::Text(wire_name));
    map.insert(PAYLOAD_KEY.to_string(), PrimitiveValue::Mapping(payload));
    PrimitiveValue::Mapping(map)
}

struct EncodePass<'r> {
    registry: &'r ClassRegistry,
    aliases: EncodeAliasTable,
}

impl EncodePass<'_> {
    fn encode_node(&mut self, node: &Node, depth: usize) -> ArchiveResult<PrimitiveValue> {
        if depth > MAX_NESTING_DEPTH {
            return Err(ArchiveError::UnsupportedValue(format!(
                "graph nests deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }

        Ok(match node {
            Node::Null => PrimitiveValue::Null,
            Node::Bool(b) => PrimitiveValue::Bool(*b),
            Node::Integer(i) => PrimitiveValue::Integer(*i),
            Node::Float(f) if f.is_finite() => PrimitiveValue::Float(*f),
            Node::Float(f) => {
                return Err(ArchiveError::UnsupportedValue(format!("non-finite float {}", f)))
            }
            Node::Text(s) => PrimitiveValue::Text(s.clone()),
            Node::Bytes(b) => PrimitiveValue::Bytes(b.clone()),
            Node::Sequence(items) => PrimitiveValue::Sequence(
                items
                    .iter()
                    .map(|item| self.encode_node(item, depth + 1))
                    .collect::<ArchiveResult<_>>()?,
            ),
            Node::Mapping(map) => PrimitiveValue::Mapping(self.encode_fields(map, depth)?),
            Node::Object(obj) => self.encode_object(obj, depth)?,
        })
    }

    /// BTreeMap iteration is the canonical key order
    fn encode_fields(
        &mut self,
        fields: &BTreeMap<String, Node>,
        depth: usize,
    ) -> ArchiveResult<BTreeMap<String, PrimitiveValue>> {
        let mut out = BTreeMap::new();
        for (key, field) in fields {
            check_key(key)?;
            out.insert(key.clone(), self.encode_node(field, depth + 1)?);
        }
        Ok(out)
    }

    fn encode_object(&mut self, obj: &ObjectRef, depth: usize) -> ArchiveResult<PrimitiveValue> {
        let wire_name = self.registry.wire_name_of(obj)?.to_string();
        if let Visit::Repeat(index) = self.aliases.visit(obj)? {
            return Ok(alias_node(index));
        }

        let mut encoder = KeyedEncoder::new();
        obj.encode_with(&mut encoder)?;
        let payload = self.encode_fields(&encoder.into_fields(), depth)?;
        self.aliases.finish(obj);

        Ok(object_node(wire_name, payload))
    }
}

struct DecodePass<'r> {
    registry: &'r ClassRegistry,
    options: DecodeOptions,
    aliases: DecodeAliasTable,
}

impl DecodePass<'_> {
    fn decode_value(&mut self, value: &PrimitiveValue, depth: usize) -> ArchiveResult<Node> {
        if depth > MAX_NESTING_DEPTH {
            return Err(ArchiveError::MalformedArchive(format!(
                "archive nests deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }

        Ok(match value {
            PrimitiveValue::Null => Node::Null,
            PrimitiveValue::Bool(b) => Node::Bool(*b),
            PrimitiveValue::Integer(i) => Node::Integer(*i),
            PrimitiveValue::Float(f) => Node::Float(*f),
            PrimitiveValue::Text(s) => Node::Text(s.clone()),
            PrimitiveValue::Bytes(b) => Node::Bytes(b.clone()),
            PrimitiveValue::Sequence(items) => Node::Sequence(
                items
                    .iter()
                    .map(|item| self.decode_value(item, depth + 1))
                    .collect::<ArchiveResult<_>>()?,
            ),
            PrimitiveValue::Mapping(map) => {
                if let Some(index) = map.get(ALIAS_KEY) {
                    check_node_keys(map, &[ALIAS_KEY])?;
                    self.decode_alias(index)?
                } else if let Some(class) = map.get(CLASS_KEY) {
                    check_node_keys(map, &[CLASS_KEY, PAYLOAD_KEY])?;
                    self.decode_object(class, map.get(PAYLOAD_KEY), depth)?
                } else {
                    Node::Mapping(self.decode_fields(map, depth)?)
                }
            }
        })
    }

    fn decode_fields(
        &mut self,
        map: &BTreeMap<String, PrimitiveValue>,
        depth: usize,
    ) -> ArchiveResult<BTreeMap<String, Node>> {
        let mut out = BTreeMap::new();
        for (key, value) in map {
            if key.starts_with(RESERVED_PREFIX) {
                return Err(ArchiveError::MalformedArchive(format!(
                    "unexpected reserved key `{}`",
                    key
                )));
            }
            out.insert(key.clone(), self.decode_value(value, depth + 1)?);
        }
        Ok(out)
    }

    fn decode_alias(&mut self, index: &PrimitiveValue) -> ArchiveResult<Node> {
        let index = index
            .as_i64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| {
                ArchiveError::MalformedArchive(format!(
                    "alias index should be a non-negative integer, found {}",
                    index.kind()
                ))
            })?;
        Ok(match self.aliases.resolve(index)? {
            Some(obj) => Node::Object(obj),
            None => Node::Null,
        })
    }

    fn decode_object(
        &mut self,
        class: &PrimitiveValue,
        payload: Option<&PrimitiveValue>,
        depth: usize,
    ) -> ArchiveResult<Node> {
        let wire_name = class.as_str().ok_or_else(|| {
            ArchiveError::MalformedArchive(format!("class tag should be text, found {}", class.kind()))
        })?;
        let payload = payload.and_then(PrimitiveValue::as_mapping).ok_or_else(|| {
            ArchiveError::MalformedArchive(format!("object `{}` has no payload mapping", wire_name))
        })?;

        let known = self.registry.is_registered(wire_name);
        if !known && !self.options.skip_unknown_classes {
            return Err(ArchiveError::UnknownClass(wire_name.to_string()));
        }

        let index = self.aliases.reserve();
        // Children must be visited even when skipping, to keep later indices aligned.
        let fields = self.decode_fields(payload, depth)?;

        if !known {
            warn!(class = wire_name, "skipping object of unknown class");
            self.aliases.drop_slot(index);
            return Ok(Node::Null);
        }

        let decoder = KeyedDecoder::new(wire_name, fields);
        let obj = self.registry.construct(wire_name, &decoder)?;
        self.aliases.fill(index, ObjectRef::clone(&obj));
        Ok(Node::Object(obj))
    }
}
