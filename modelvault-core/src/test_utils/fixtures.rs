//! Model types used across unit tests

use crate::archive::{Archivable, ArchiveResult, ClassRegistry, KeyedDecoder, KeyedEncoder};
use crate::store::PersistentModel;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
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
    pub priority: Option<i64>,
    pub tag: Option<Arc<Tag>>,
}

impl TodoItem {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            checked: false,
            priority: None,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: &Arc<Tag>) -> Self {
        self.tag = Some(Arc::clone(tag));
        self
    }
}

impl Archivable for TodoItem {
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
        encoder.encode_str("label", &self.label);
        encoder.encode_bool("checked", self.checked);
        if let Some(priority) = self.priority {
            encoder.encode_i64("priority", priority);
        }
        encoder.encode_optional_object("tag", self.tag.as_ref());
        Ok(())
    }

    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
        Ok(Self {
            label: decoder.decode_string("label")?,
            checked: decoder.decode_bool("checked")?,
            priority: decoder.decode_optional_i64("priority")?,
            tag: decoder.decode_optional_object("tag")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TodoList {
    pub items: Vec<Arc<TodoItem>>,
}

impl Archivable for TodoList {
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
        encoder.encode_objects("items", &self.items);
        Ok(())
    }

    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
        Ok(Self {
            items: decoder.decode_objects("items")?,
        })
    }
}

impl PersistentModel for TodoList {
    const SAVE_NAME: &'static str = "todos";
}

/// Model whose merge keeps fields the incoming value leaves unset
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

    fn merge_values_from(&mut self, other: &Self) {
        if other.theme.is_some() {
            self.theme = other.theme.clone();
        }
        if other.font_size.is_some() {
            self.font_size = other.font_size;
        }
    }
}

/// Node that can point back at itself
#[derive(Debug)]
pub struct LinkNode {
    pub name: String,
    pub next: Mutex<Option<Arc<LinkNode>>>,
}

impl LinkNode {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            next: Mutex::new(None),
        })
    }

    pub fn link(&self, next: &Arc<LinkNode>) {
        *self.next.lock().unwrap() = Some(Arc::clone(next));
    }

    pub fn unlink(&self) {
        self.next.lock().unwrap().take();
    }
}

impl Archivable for LinkNode {
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

pub fn test_registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry
        .register::<Tag>("Tag")
        .register::<TodoItem>("TodoItem")
        .register::<TodoList>("TodoList")
        .register::<Preferences>("Preferences")
        .register::<LinkNode>("LinkNode");
    registry
}
