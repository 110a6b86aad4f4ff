/*
    errors.rs - Error types for archiving, codecs and the encrypted container

    Every failure is reported to the caller; nothing in this layer substitutes
    defaults. Only `UnknownClass` (and missing files, one level up) are
    considered recoverable.
*/

use thiserror::Error;

/// Errors raised while encoding, decoding, sealing or opening archives
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Encode met an object whose concrete type has no wire name
    #[error("Type `{0}` is not registered with the class registry")]
    UnregisteredType(&'static str),

    /// Decode met a wire name the registry does not know
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// The value cannot be represented losslessly by every format
    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    /// An object was reached again while its own payload was being encoded
    #[error("Cyclic reference through `{0}`")]
    CyclicReference(String),

    #[error("Alias index {index} out of range ({len} objects decoded)")]
    AliasIndexOutOfRange { index: usize, len: usize },

    /// Wrong password or tampered bytes; deliberately indistinguishable
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    /// Typed decode found an object of a different class
    #[error("Expected `{expected}`, found `{found}`")]
    UnexpectedClass { expected: String, found: String },

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Byte-level encode/decode failure inside a codec
    #[error("Codec error: {0}")]
    Codec(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Whether a caller may fall back to defaults instead of aborting
    pub fn is_recoverable(&self) -> bool {
        match self {
            ArchiveError::UnknownClass(_) => true,
            ArchiveError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

impl From<bincode::Error> for ArchiveError {
    fn from(err: bincode::Error) -> Self {
        ArchiveError::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        ArchiveError::Codec(err.to_string())
    }
}
