/*
    binary.rs - Compact binary codec

    Format:
    - Magic: 8 bytes "MVARCB01"
    - Body: bincode (varint integers) encoding of the PrimitiveValue tree
*/

use super::{ArchiveCodec, ArchiveFormat};
use crate::archive::{ArchiveError, ArchiveResult, PrimitiveValue};
use bincode::Options;

const MAGIC: &[u8; 8] = b"MVARCB01";

/// Upper bound on a decoded body, so a corrupt length prefix cannot exhaust memory
pub const MAX_BINARY_ARCHIVE_SIZE: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl BinaryCodec {
    pub fn new() -> Self {
        Self
    }

    fn options() -> impl Options {
        bincode::DefaultOptions::new().with_limit(MAX_BINARY_ARCHIVE_SIZE)
    }
}

impl ArchiveCodec for BinaryCodec {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Binary
    }

    fn encode(&self, value: &PrimitiveValue) -> ArchiveResult<Vec<u8>> {
        let mut out = MAGIC.to_vec();
        Self::options().serialize_into(&mut out, value)?;
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> ArchiveResult<PrimitiveValue> {
        let body = bytes.strip_prefix(MAGIC.as_slice()).ok_or_else(|| {
            ArchiveError::MalformedArchive("missing binary archive header".to_string())
        })?;
        Ok(Self::options().deserialize(body)?)
    }
}
