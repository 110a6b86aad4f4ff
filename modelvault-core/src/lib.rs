//! modelvault core
//!
//! Object-graph archiving for application models: a keyed coding layer with
//! polymorphic class tags and alias compression, interchangeable byte codecs,
//! a password-based encrypted container, and a store that loads, merges and
//! saves a shared model instance.

pub mod archive;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod logging;
pub mod store;

#[cfg(test)]
mod test_utils;

pub use archive::{
    Archivable, ArchiveError, ArchiveResult, Archiver, ClassRegistry, DecodeOptions,
    KeyedDecoder, KeyedEncoder, Node, ObjectRef, PrimitiveValue,
};
pub use codec::{
    decode_from_bytes, decode_object_from_bytes, encode_to_bytes, inspect_bytes, ArchiveCodec,
    ArchiveFormat, ArchiveSummary, BinaryCodec, EncryptedCodec, JsonCodec,
};
pub use config::Config;
pub use crypto::{CryptoArchive, SchemeVersion};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogLevel};
pub use store::{ModelStore, PersistentModel, StoreError, StoreEvent, StoreResult};
