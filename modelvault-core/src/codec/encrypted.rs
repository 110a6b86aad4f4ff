//! Password-protected codec decorator
//!
//! Encodes with the inner codec, seals those bytes into a [`CryptoArchive`],
//! then stores the container through the same inner codec. A sealed JSON
//! archive is therefore still a JSON document, just an opaque one.

use super::{ArchiveCodec, ArchiveFormat};
use crate::archive::{declared_root_class, ArchiveResult, PrimitiveValue};
use crate::crypto::{CryptoArchive, SchemeVersion};
use std::fmt;
use zeroize::Zeroizing;

pub struct EncryptedCodec {
    inner: Box<dyn ArchiveCodec>,
    password: Zeroizing<String>,
    scheme: SchemeVersion,
}

impl EncryptedCodec {
    pub fn new(inner: Box<dyn ArchiveCodec>, password: &str) -> Self {
        Self {
            inner,
            password: Zeroizing::new(password.to_string()),
            scheme: SchemeVersion::CURRENT,
        }
    }

    /// Seal with an older scheme; opening always follows the archive's own version
    pub fn with_scheme(mut self, scheme: SchemeVersion) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn scheme(&self) -> SchemeVersion {
        self.scheme
    }

    pub fn inner(&self) -> &dyn ArchiveCodec {
        self.inner.as_ref()
    }
}

impl ArchiveCodec for EncryptedCodec {
    fn format(&self) -> ArchiveFormat {
        self.inner.format()
    }

    fn encode(&self, value: &PrimitiveValue) -> ArchiveResult<Vec<u8>> {
        let plain = Zeroizing::new(self.inner.encode(value)?);
        let sealed = CryptoArchive::seal_with_version(
            &plain,
            &self.password,
            declared_root_class(value),
            self.scheme,
        )?;
        self.inner.encode(&sealed.to_value())
    }

    fn decode(&self, bytes: &[u8]) -> ArchiveResult<PrimitiveValue> {
        let sealed = CryptoArchive::from_value(&self.inner.decode(bytes)?)?;
        let plain = Zeroizing::new(sealed.open(&self.password)?);
        self.inner.decode(&plain)
    }
}

impl fmt::Debug for EncryptedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedCodec")
            .field("inner", &self.inner)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}
