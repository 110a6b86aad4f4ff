//! Class registry
//!
//! Maps stable wire names to concrete Rust types. Encoding asks for the
//! *preferred* wire name of an object's exact type; decoding accepts the
//! preferred name and any legacy alias, so archives written before a rename
//! keep loading.

use super::errors::{ArchiveError, ArchiveResult};
use super::node::{type_id_of, Archivable, KeyedDecoder, ObjectRef};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

type ObjectFactory = fn(&KeyedDecoder) -> ArchiveResult<ObjectRef>;

fn construct<T: Archivable>(decoder: &KeyedDecoder) -> ArchiveResult<ObjectRef> {
    Ok(Arc::new(T::decode_with(decoder)?))
}

/// Concrete type a wire name resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassInfo {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

#[derive(Clone)]
struct ClassBinding {
    info: ClassInfo,
    factory: ObjectFactory,
}

/// Bidirectional wire name ↔ type mapping
#[derive(Clone, Default)]
pub struct ClassRegistry {
    /// Every decodable name, preferred and legacy
    by_name: HashMap<String, ClassBinding>,
    /// Name used when encoding each type
    preferred: HashMap<TypeId, String>,
}

static GLOBAL_REGISTRY: OnceLock<RwLock<ClassRegistry>> = OnceLock::new();

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry
    ///
    /// Populate it during start-up; afterwards take the write lock only for
    /// the rare rebinding.
    pub fn global() -> &'static RwLock<ClassRegistry> {
        GLOBAL_REGISTRY.get_or_init(|| RwLock::new(ClassRegistry::new()))
    }

    /// Bind `wire_name` to `T` and make it the name `T` is encoded under
    ///
    /// Names previously registered for `T` stay decodable.
    pub fn register<T: Archivable>(&mut self, wire_name: impl Into<String>) -> &mut Self {
        let wire_name = wire_name.into();
        self.bind::<T>(wire_name.clone());
        self.preferred.insert(TypeId::of::<T>(), wire_name);
        self
    }

    /// Bind a decode-only name for `T`
    pub fn register_alias<T: Archivable>(&mut self, legacy_name: impl Into<String>) -> &mut Self {
        self.bind::<T>(legacy_name.into());
        self
    }

    fn bind<T: Archivable>(&mut self, wire_name: String) {
        let binding = ClassBinding {
            info: ClassInfo {
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
            },
            factory: construct::<T>,
        };

        if let Some(previous) = self.by_name.insert(wire_name.clone(), binding) {
            if previous.info.type_id != TypeId::of::<T>() {
                debug!(
                    wire_name = %wire_name,
                    from = previous.info.type_name,
                    to = std::any::type_name::<T>(),
                    "rebinding wire name"
                );
                // The old type loses its claim on this name.
                if self.preferred.get(&previous.info.type_id) == Some(&wire_name) {
                    self.preferred.remove(&previous.info.type_id);
                }
            }
        }
    }

    pub fn wire_name_for<T: Archivable>(&self) -> Option<&str> {
        self.wire_name_for_type(TypeId::of::<T>())
    }

    pub fn wire_name_for_type(&self, type_id: TypeId) -> Option<&str> {
        self.preferred.get(&type_id).map(String::as_str)
    }

    pub fn type_for(&self, wire_name: &str) -> Option<ClassInfo> {
        self.by_name.get(wire_name).map(|binding| binding.info)
    }

    pub fn is_registered(&self, wire_name: &str) -> bool {
        self.by_name.contains_key(wire_name)
    }

    /// Number of decodable wire names
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Preferred wire name of an object's exact runtime type
    pub(crate) fn wire_name_of(&self, obj: &ObjectRef) -> ArchiveResult<&str> {
        self.wire_name_for_type(type_id_of(obj))
            .ok_or_else(|| ArchiveError::UnregisteredType((**obj).type_name()))
    }

    pub(crate) fn construct(&self, wire_name: &str, decoder: &KeyedDecoder) -> ArchiveResult<ObjectRef> {
        let binding = self
            .by_name
            .get(wire_name)
            .ok_or_else(|| ArchiveError::UnknownClass(wire_name.to_string()))?;
        (binding.factory)(decoder)
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.by_name.keys().collect();
        names.sort();
        f.debug_struct("ClassRegistry").field("names", &names).finish()
    }
}
