/*
    codec - Byte formats for archived value trees

    A codec only maps `PrimitiveValue` <-> bytes; object graphs, aliasing and
    class names are the archiver's business. Formats are picked by
    `ArchiveFormat`, and `EncryptedCodec` wraps any of them.
*/

pub mod binary;
pub mod encrypted;
pub mod json;

pub use binary::BinaryCodec;
pub use encrypted::EncryptedCodec;
pub use json::JsonCodec;

use crate::archive::{
    declared_root_class, Archivable, ArchiveError, ArchiveResult, Archiver, Node, PrimitiveValue,
};
use crate::crypto::CryptoArchive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Strategy interface implemented by every save format
pub trait ArchiveCodec: Send + Sync + fmt::Debug {
    fn format(&self) -> ArchiveFormat;

    fn encode(&self, value: &PrimitiveValue) -> ArchiveResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> ArchiveResult<PrimitiveValue>;
}

/// Format identifier used in configuration and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    #[default]
    Json,
    Binary,
}

impl ArchiveFormat {
    pub fn codec(self) -> Box<dyn ArchiveCodec> {
        match self {
            ArchiveFormat::Json => Box::new(JsonCodec::new()),
            ArchiveFormat::Binary => Box::new(BinaryCodec::new()),
        }
    }

    /// File extension for saved archives
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Json => "json",
            ArchiveFormat::Binary => "bin",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveFormat::Json => "json",
            ArchiveFormat::Binary => "binary",
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ArchiveFormat::Json),
            "binary" | "bin" => Ok(ArchiveFormat::Binary),
            _ => Err(ArchiveError::Codec(format!("Unknown archive format: {}", s))),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive `root` (with envelope) and serialize it through `codec`
pub fn encode_to_bytes(
    archiver: &Archiver<'_>,
    root: &Node,
    codec: &dyn ArchiveCodec,
) -> ArchiveResult<Vec<u8>> {
    codec.encode(&archiver.archive(root)?)
}

pub fn decode_from_bytes(
    archiver: &Archiver<'_>,
    bytes: &[u8],
    codec: &dyn ArchiveCodec,
) -> ArchiveResult<Node> {
    archiver.unarchive(&codec.decode(bytes)?)
}

/// Decode and require the root object to be a `T`
pub fn decode_object_from_bytes<T: Archivable>(
    archiver: &Archiver<'_>,
    bytes: &[u8],
    codec: &dyn ArchiveCodec,
) -> ArchiveResult<Arc<T>> {
    archiver.unarchive_object(&codec.decode(bytes)?)
}

/// What a saved file holds, read without decrypting or decoding objects
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveSummary {
    pub encrypted: bool,
    pub root_class: Option<String>,
    pub scheme: Option<crate::crypto::SchemeVersion>,
}

/// Inspect bytes written by `codec` (or by an [`EncryptedCodec`] over it)
pub fn inspect_bytes(bytes: &[u8], codec: &dyn ArchiveCodec) -> ArchiveResult<ArchiveSummary> {
    let value = codec.decode(bytes)?;
    if CryptoArchive::is_crypto_archive(&value) {
        let sealed = CryptoArchive::from_value(&value)?;
        return Ok(ArchiveSummary {
            encrypted: true,
            root_class: sealed.root_class().map(str::to_string),
            scheme: Some(sealed.version()),
        });
    }
    Ok(ArchiveSummary {
        encrypted: false,
        root_class: declared_root_class(&value).map(str::to_string),
        scheme: None,
    })
}
