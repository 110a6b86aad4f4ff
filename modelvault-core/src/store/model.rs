//! Models the store can persist

use crate::archive::Archivable;
use std::path::PathBuf;

/// A top-level model with a default value and a saved location
pub trait PersistentModel: Archivable + Default + Clone {
    /// File stem of the saved archive inside the data directory
    const SAVE_NAME: &'static str;

    /// Bundled defaults merged over `Default::default()` before saved data
    ///
    /// Read unencrypted; the format follows the file extension (`.bin` for
    /// binary, anything else JSON).
    fn resource_file() -> Option<PathBuf> {
        None
    }

    /// Fold a later layer into `self`
    ///
    /// The default replaces `self` wholesale; override to merge field by field.
    fn merge_values_from(&mut self, other: &Self) {
        *self = other.clone();
    }
}
