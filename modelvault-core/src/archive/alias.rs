//! Per-pass alias tables
//!
//! Indices are handed out when an object node is *entered* (pre-order), so
//! the encoder and decoder agree on numbering as long as both walk the graph
//! in the same canonical order. Neither table outlives a single pass.

use super::errors::{ArchiveError, ArchiveResult};
use super::node::{identity_of, ObjectRef};
use std::collections::HashMap;

/// Outcome of meeting an object during encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visit {
    /// Not seen before; encode in full under this index
    First(usize),
    /// Already fully encoded; emit an alias to this index
    Repeat(usize),
}

#[derive(Debug)]
struct EncodeEntry {
    index: usize,
    complete: bool,
    /// Keeps the allocation alive so its address cannot be reused mid-pass
    _object: ObjectRef,
}

#[derive(Debug, Default)]
pub(crate) struct EncodeAliasTable {
    entries: HashMap<usize, EncodeEntry>,
    next_index: usize,
    aliases_emitted: usize,
}

impl EncodeAliasTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fails with `CyclicReference` if `obj` is still being encoded
    pub(crate) fn visit(&mut self, obj: &ObjectRef) -> ArchiveResult<Visit> {
        let identity = identity_of(obj);
        if let Some(entry) = self.entries.get(&identity) {
            if !entry.complete {
                return Err(ArchiveError::CyclicReference((**obj).type_name().to_string()));
            }
            self.aliases_emitted += 1;
            return Ok(Visit::Repeat(entry.index));
        }

        let index = self.next_index;
        self.next_index += 1;
        self.entries.insert(
            identity,
            EncodeEntry {
                index,
                complete: false,
                _object: ObjectRef::clone(obj),
            },
        );
        Ok(Visit::First(index))
    }

    pub(crate) fn finish(&mut self, obj: &ObjectRef) {
        if let Some(entry) = self.entries.get_mut(&identity_of(obj)) {
            entry.complete = true;
        }
    }

    pub(crate) fn objects(&self) -> usize {
        self.next_index
    }

    pub(crate) fn aliases(&self) -> usize {
        self.aliases_emitted
    }
}

#[derive(Debug)]
enum Slot {
    /// Reserved on entry, payload still decoding
    Pending,
    Ready(ObjectRef),
    /// Unknown class skipped at the caller's request
    Dropped,
}

#[derive(Debug, Default)]
pub(crate) struct DecodeAliasTable {
    slots: Vec<Slot>,
}

impl DecodeAliasTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reserve(&mut self) -> usize {
        self.slots.push(Slot::Pending);
        self.slots.len() - 1
    }

    pub(crate) fn fill(&mut self, index: usize, obj: ObjectRef) {
        self.slots[index] = Slot::Ready(obj);
    }

    pub(crate) fn drop_slot(&mut self, index: usize) {
        self.slots[index] = Slot::Dropped;
    }

    /// `Ok(None)` for a dropped object
    pub(crate) fn resolve(&self, index: usize) -> ArchiveResult<Option<ObjectRef>> {
        match self.slots.get(index) {
            None => Err(ArchiveError::AliasIndexOutOfRange {
                index,
                len: self.slots.len(),
            }),
            Some(Slot::Pending) => Err(ArchiveError::MalformedArchive(format!(
                "alias {} refers to an object that is still being decoded",
                index
            ))),
            Some(Slot::Ready(obj)) => Ok(Some(ObjectRef::clone(obj))),
            Some(Slot::Dropped) => Ok(None),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Tag;
    use std::sync::Arc;

    #[test]
    fn test_indices_follow_first_encounter() {
        let a: ObjectRef = Arc::new(Tag::new("a"));
        let b: ObjectRef = Arc::new(Tag::new("b"));
        let mut table = EncodeAliasTable::new();

        assert_eq!(table.visit(&a).unwrap(), Visit::First(0));
        table.finish(&a);
        assert_eq!(table.visit(&b).unwrap(), Visit::First(1));
        table.finish(&b);
        assert_eq!(table.visit(&a).unwrap(), Visit::Repeat(0));
        assert_eq!(table.objects(), 2);
        assert_eq!(table.aliases(), 1);
    }

    #[test]
    fn test_in_progress_object_is_a_cycle() {
        let a: ObjectRef = Arc::new(Tag::new("a"));
        let mut table = EncodeAliasTable::new();

        table.visit(&a).unwrap();
        let err = table.visit(&a).unwrap_err();
        assert!(matches!(err, ArchiveError::CyclicReference(_)));
    }

    #[test]
    fn test_equal_values_are_not_aliased() {
        let a: ObjectRef = Arc::new(Tag::new("same"));
        let b: ObjectRef = Arc::new(Tag::new("same"));
        let mut table = EncodeAliasTable::new();

        table.visit(&a).unwrap();
        table.finish(&a);
        assert_eq!(table.visit(&b).unwrap(), Visit::First(1));
    }

    #[test]
    fn test_decode_slots() {
        let obj: ObjectRef = Arc::new(Tag::new("a"));
        let mut table = DecodeAliasTable::new();

        let first = table.reserve();
        let second = table.reserve();
        assert!(matches!(table.resolve(first), Err(ArchiveError::MalformedArchive(_))));

        table.fill(first, obj.clone());
        table.drop_slot(second);
        assert!(Arc::ptr_eq(&table.resolve(first).unwrap().unwrap(), &obj));
        assert!(table.resolve(second).unwrap().is_none());
        assert!(matches!(
            table.resolve(7),
            Err(ArchiveError::AliasIndexOutOfRange { index: 7, len: 2 })
        ));
        assert_eq!(table.len(), 2);
    }
}
