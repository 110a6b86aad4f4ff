//! Shared models for integration tests

#![allow(dead_code)]

use modelvault_core::{
    Archivable, ArchiveResult, ClassRegistry, KeyedDecoder, KeyedEncoder, PersistentModel,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Debug, Clone)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub fn shared(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
        })
    }
}

impl Archivable for Tag {
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
        encoder.encode_str("name", &self.name);
        Ok(())
    }

    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
        Ok(Self {
            name: decoder.decode_string("name")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TodoItem {
    pub label: String,
    pub checked: bool,
    pub tags: Vec<Arc<Tag>>,
}

impl TodoItem {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            checked: false,
            tags: Vec::new(),
        }
    }

    pub fn tagged(label: &str, tags: &[&Arc<Tag>]) -> Arc<Self> {
        Arc::new(Self {
            tags: tags.iter().map(|tag| Arc::clone(tag)).collect(),
            ..Self::new(label)
        })
    }
}

impl Archivable for TodoItem {
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
        encoder.encode_str("label", &self.label);
        encoder.encode_bool("checked", self.checked);
        encoder.encode_objects("tags", &self.tags);
        Ok(())
    }

    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
        Ok(Self {
            label: decoder.decode_string("label")?,
            checked: decoder.decode_bool("checked")?,
            tags: if decoder.contains("tags") {
                decoder.decode_objects("tags")?
            } else {
                Vec::new()
            },
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TodoList {
    pub title: String,
    pub items: Vec<Arc<TodoItem>>,
}

impl Archivable for TodoList {
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
        encoder.encode_str("title", &self.title);
        encoder.encode_objects("items", &self.items);
        Ok(())
    }

    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
        Ok(Self {
            title: decoder.decode_string("title")?,
            items: decoder.decode_objects("items")?,
        })
    }
}

impl PersistentModel for TodoList {
    const SAVE_NAME: &'static str = "todo-list";
}

/// Preferences shipped with bundled defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    pub theme: Option<String>,
    pub font_size: Option<i64>,
}

impl Archivable for Preferences {
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
        encoder.encode_optional_str("theme", self.theme.as_deref());
        if let Some(size) = self.font_size {
            encoder.encode_i64("fontSize", size);
        }
        Ok(())
    }

    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
        Ok(Self {
            theme: decoder.decode_optional_string("theme")?,
            font_size: decoder.decode_optional_i64("fontSize")?,
        })
    }
}

impl PersistentModel for Preferences {
    const SAVE_NAME: &'static str = "preferences";

    fn resource_file() -> Option<PathBuf> {
        Some(
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("tests")
                .join("data")
                .join("preferences-defaults.json"),
        )
    }

    fn merge_values_from(&mut self, other: &Self) {
        if other.theme.is_some() {
            self.theme = other.theme.clone();
        }
        if other.font_size.is_some() {
            self.font_size = other.font_size;
        }
    }
}

/// Mutable link, for building cycles
#[derive(Debug)]
pub struct Chain {
    pub name: String,
    pub next: Mutex<Option<Arc<Chain>>>,
}

impl Chain {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            next: Mutex::new(None),
        })
    }

    pub fn point_to(&self, next: &Arc<Chain>) {
        *self.next.lock().unwrap() = Some(Arc::clone(next));
    }

    pub fn cut(&self) {
        self.next.lock().unwrap().take();
    }
}

impl Archivable for Chain {
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
        encoder.encode_str("name", &self.name);
        let next = self.next.lock().unwrap().clone();
        encoder.encode_optional_object("next", next.as_ref());
        Ok(())
    }

    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
        Ok(Self {
            name: decoder.decode_string("name")?,
            next: Mutex::new(decoder.decode_optional_object("next")?),
        })
    }
}

pub fn registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry
        .register::<Tag>("Tag")
        .register::<TodoItem>("TodoItem")
        .register::<TodoList>("TodoList")
        .register::<Preferences>("Preferences")
        .register::<Chain>("Chain");
    registry
}

pub fn shared_registry() -> Arc<RwLock<ClassRegistry>> {
    Arc::new(RwLock::new(registry()))
}
