/*
    store - Persistence orchestrator for top-level models

    Responsibilities:
    - Pick the save codec from configuration (optionally sealed with a password)
    - Load: defaults, then bundled resource data, then previously saved data
    - Keep one shared instance per store, replaced under a lock by reload()
    - Write saves atomically and notify subscribers

    A store owns its shared instance; applications that want a process-wide
    singleton keep the store itself in a static.
*/

pub mod errors;
pub mod events;
pub mod files;
pub mod model;

pub use errors::{StoreError, StoreResult};
pub use events::{EventBroadcaster, StoreEvent};
pub use model::PersistentModel;

use crate::archive::{ArchiveError, Archiver, ClassRegistry, DecodeOptions, Node};
use crate::codec::{decode_object_from_bytes, encode_to_bytes, ArchiveCodec, ArchiveFormat, EncryptedCodec};
use crate::config::Config;
use files::{read_optional, remove_optional, write_atomic};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub struct ModelStore<T: PersistentModel> {
    registry: Arc<RwLock<ClassRegistry>>,
    codec: Box<dyn ArchiveCodec>,
    options: DecodeOptions,
    save_path: PathBuf,
    shared: Mutex<Option<Arc<T>>>,
    events: EventBroadcaster,
}

impl<T: PersistentModel> ModelStore<T> {
    /// Build a store from configuration
    ///
    /// `password` is required when `config.crypto.enabled` is set and ignored
    /// otherwise.
    pub fn new(
        config: &Config,
        registry: Arc<RwLock<ClassRegistry>>,
        password: Option<&str>,
    ) -> StoreResult<Self> {
        config.validate()?;

        let plain = config.store.format.codec();
        let codec: Box<dyn ArchiveCodec> = match (config.crypto.enabled, password) {
            (false, _) => plain,
            (true, Some(password)) => Box::new(
                EncryptedCodec::new(plain, password).with_scheme(config.crypto.scheme_version),
            ),
            (true, None) => {
                return Err(StoreError::InvalidConfig(format!(
                    "encryption enabled for `{}` but no password given",
                    T::SAVE_NAME
                )))
            }
        };

        let save_path = config
            .store
            .data_dir
            .join(format!("{}.{}", T::SAVE_NAME, config.store.format.extension()));

        Ok(Self {
            registry,
            codec,
            options: DecodeOptions {
                skip_unknown_classes: config.store.skip_unknown_classes,
            },
            save_path,
            shared: Mutex::new(None),
            events: EventBroadcaster::default(),
        })
    }

    /// Build a store, reading the password from the configured environment variable
    pub fn from_config(config: &Config, registry: Arc<RwLock<ClassRegistry>>) -> StoreResult<Self> {
        let password = config.resolve_password()?;
        Self::new(config, registry, password.as_deref().map(String::as_str))
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// The shared instance, loading it on first access
    pub fn shared_instance(&self) -> StoreResult<Arc<T>> {
        let mut shared = self.lock_shared()?;
        if let Some(model) = shared.as_ref() {
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(self.load()?);
        *shared = Some(Arc::clone(&model));
        self.events.emit(StoreEvent::Loaded { model: T::SAVE_NAME });
        Ok(model)
    }

    /// Re-run the load sequence and swap the shared instance
    ///
    /// Holders of the previous `Arc` keep their snapshot.
    pub fn reload(&self) -> StoreResult<Arc<T>> {
        let mut shared = self.lock_shared()?;
        let model = Arc::new(self.load()?);
        *shared = Some(Arc::clone(&model));
        info!(model = T::SAVE_NAME, "reloaded shared instance");
        self.events.emit(StoreEvent::Reloaded { model: T::SAVE_NAME });
        Ok(model)
    }

    /// Write the shared instance to the save path
    pub fn save(&self) -> StoreResult<()> {
        let mut shared = self.lock_shared()?;
        let model = match shared.as_ref() {
            Some(model) => Arc::clone(model),
            None => {
                let model = Arc::new(self.load()?);
                *shared = Some(Arc::clone(&model));
                model
            }
        };
        self.write_model(&model, &self.save_path)?;
        self.events.emit(StoreEvent::Saved {
            model: T::SAVE_NAME,
            path: self.save_path.clone(),
        });
        Ok(())
    }

    /// Save `model` and make it the shared instance
    pub fn replace(&self, model: T) -> StoreResult<Arc<T>> {
        let mut shared = self.lock_shared()?;
        let model = Arc::new(model);
        self.write_model(&model, &self.save_path)?;
        *shared = Some(Arc::clone(&model));
        self.events.emit(StoreEvent::Saved {
            model: T::SAVE_NAME,
            path: self.save_path.clone(),
        });
        Ok(model)
    }

    /// Remove the saved archive
    ///
    /// The shared instance stays as it is until the next `reload()`.
    /// Returns `false` when nothing was saved.
    pub fn delete_saved(&self) -> StoreResult<bool> {
        let _shared = self.lock_shared()?;
        let removed = remove_optional(&self.save_path)?;
        if removed {
            self.events.emit(StoreEvent::Deleted {
                model: T::SAVE_NAME,
                path: self.save_path.clone(),
            });
        }
        Ok(removed)
    }

    /// Archive `model` through the store's codec and write it atomically
    ///
    /// Holds the store lock, so it never races `save()` or `replace()`.
    pub fn write_to_file(&self, model: &Arc<T>, path: &Path) -> StoreResult<()> {
        let _shared = self.lock_shared()?;
        self.write_model(model, path)
    }

    /// Callers hold the store lock
    fn write_model(&self, model: &Arc<T>, path: &Path) -> StoreResult<()> {
        let registry = self.read_registry()?;
        let archiver = Archiver::new(&registry);
        let bytes = encode_to_bytes(&archiver, &Node::object(model), self.codec.as_ref())?;
        write_atomic(path, &bytes)?;
        debug!(model = T::SAVE_NAME, path = %path.display(), bytes = bytes.len(), "saved model");
        Ok(())
    }

    /// Read a model written by [`write_to_file`](Self::write_to_file)
    ///
    /// `Ok(None)` when the file does not exist.
    pub fn load_from_file(&self, path: &Path) -> StoreResult<Option<T>> {
        self.read_model(path, self.codec.as_ref())
    }

    fn read_model(&self, path: &Path, codec: &dyn ArchiveCodec) -> StoreResult<Option<T>> {
        let Some(bytes) = read_optional(path)? else {
            return Ok(None);
        };
        let registry = self.read_registry()?;
        let archiver = Archiver::new(&registry).with_options(self.options);
        let model = decode_object_from_bytes::<T>(&archiver, &bytes, codec)?;
        Ok(Some(Arc::try_unwrap(model).unwrap_or_else(|shared| (*shared).clone())))
    }

    /// Defaults, then resource data, then saved data
    fn load(&self) -> StoreResult<T> {
        let mut model = T::default();

        if let Some(resource) = T::resource_file() {
            let format = match resource.extension().and_then(|ext| ext.to_str()) {
                Some("bin") => ArchiveFormat::Binary,
                _ => ArchiveFormat::Json,
            };
            if let Some(layer) = self.read_layer(&resource, format.codec().as_ref())? {
                model.merge_values_from(&layer);
            }
        }

        if let Some(layer) = self.read_layer(&self.save_path, self.codec.as_ref())? {
            model.merge_values_from(&layer);
        }

        Ok(model)
    }

    /// One load layer; unknown classes degrade to "layer absent"
    fn read_layer(&self, path: &Path, codec: &dyn ArchiveCodec) -> StoreResult<Option<T>> {
        match self.read_model(path, codec) {
            Err(StoreError::Archive(ArchiveError::UnknownClass(class))) => {
                warn!(
                    model = T::SAVE_NAME,
                    path = %path.display(),
                    class = %class,
                    "archive uses an unknown class, falling back to defaults"
                );
                Ok(None)
            }
            other => other,
        }
    }

    fn lock_shared(&self) -> StoreResult<MutexGuard<'_, Option<Arc<T>>>> {
        self.shared
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn read_registry(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, ClassRegistry>> {
        self.registry
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl<T: PersistentModel> std::fmt::Debug for ModelStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("model", &T::SAVE_NAME)
            .field("codec", &self.codec)
            .field("save_path", &self.save_path)
            .finish_non_exhaustive()
    }
}
