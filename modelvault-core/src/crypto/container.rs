//! Sealed archive container
//!
//! Every seal draws a fresh salt and IV from the OS RNG, so sealing the same
//! payload twice yields unrelated bytes. Opening re-derives the key from the
//! archive's own salt and version.

use super::scheme::{SchemeVersion, IV_LEN};
use crate::archive::{ArchiveError, ArchiveResult, PrimitiveValue, CLASS_KEY, PAYLOAD_KEY};
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Wire name of the container's object node
pub const CRYPTO_ARCHIVE_CLASS: &str = "CryptoArchive";

const IV_FIELD: &str = "iv";
const SALT_FIELD: &str = "salt";
const CIPHER_FIELD: &str = "cipher";
const VERSION_FIELD: &str = "version";
const ROOT_CLASS_FIELD: &str = "rootClass";

/// Password-sealed payload
#[derive(Clone, PartialEq)]
pub struct CryptoArchive {
    iv: Vec<u8>,
    salt: Vec<u8>,
    cipher_text: Vec<u8>,
    version: SchemeVersion,
    root_class: Option<String>,
}

impl CryptoArchive {
    /// Seal `payload` under the current scheme version
    pub fn seal(payload: &[u8], password: &str, root_class: Option<&str>) -> ArchiveResult<Self> {
        Self::seal_with_version(payload, password, root_class, SchemeVersion::CURRENT)
    }

    pub fn seal_with_version(
        payload: &[u8],
        password: &str,
        root_class: Option<&str>,
        version: SchemeVersion,
    ) -> ArchiveResult<Self> {
        let mut rng = rand::rng();
        let mut salt = vec![0u8; version.salt_len()];
        rng.fill_bytes(&mut salt);
        let mut iv = vec![0u8; IV_LEN];
        rng.fill_bytes(&mut iv);

        let key = version.derive_key(password, &salt)?;
        let cipher = Aes256Gcm::new_from_slice(key.as_ref())
            .map_err(|e| ArchiveError::Encryption(format!("Invalid key: {}", e)))?;
        let cipher_text = cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: payload,
                    aad: version.aad(),
                },
            )
            .map_err(|e| ArchiveError::Encryption(format!("Encryption failed: {}", e)))?;

        debug!(
            version = %version,
            root_class = root_class.unwrap_or("-"),
            bytes = payload.len(),
            "sealed archive"
        );

        Ok(Self {
            iv,
            salt,
            cipher_text,
            version,
            root_class: root_class.map(str::to_string),
        })
    }

    /// Recover the payload
    ///
    /// A wrong password and tampered bytes both surface as
    /// [`ArchiveError::DecryptionFailed`].
    pub fn open(&self, password: &str) -> ArchiveResult<Vec<u8>> {
        let key = self.version.derive_key(password, &self.salt)?;
        let cipher =
            Aes256Gcm::new_from_slice(key.as_ref()).map_err(|_| ArchiveError::DecryptionFailed)?;
        cipher
            .decrypt(
                Nonce::from_slice(&self.iv),
                Payload {
                    msg: &self.cipher_text,
                    aad: self.version.aad(),
                },
            )
            .map_err(|_| ArchiveError::DecryptionFailed)
    }

    pub fn version(&self) -> SchemeVersion {
        self.version
    }

    /// Wire name of the sealed root object, when it had one
    pub fn root_class(&self) -> Option<&str> {
        self.root_class.as_deref()
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn cipher_text(&self) -> &[u8] {
        &self.cipher_text
    }

    /// Object node form, storable through any codec
    pub fn to_value(&self) -> PrimitiveValue {
        let mut payload = BTreeMap::new();
        payload.insert(IV_FIELD.to_string(), PrimitiveValue::Bytes(self.iv.clone()));
        payload.insert(SALT_FIELD.to_string(), PrimitiveValue::Bytes(self.salt.clone()));
        payload.insert(CIPHER_FIELD.to_string(), PrimitiveValue::Bytes(self.cipher_text.clone()));
        payload.insert(VERSION_FIELD.to_string(), PrimitiveValue::Float(self.version.as_f64()));
        if let Some(root_class) = &self.root_class {
            payload.insert(ROOT_CLASS_FIELD.to_string(), PrimitiveValue::from(root_class.as_str()));
        }

        let mut node = BTreeMap::new();
        node.insert(CLASS_KEY.to_string(), PrimitiveValue::from(CRYPTO_ARCHIVE_CLASS));
        node.insert(PAYLOAD_KEY.to_string(), PrimitiveValue::Mapping(payload));
        PrimitiveValue::Mapping(node)
    }

    pub fn from_value(value: &PrimitiveValue) -> ArchiveResult<Self> {
        if !Self::is_crypto_archive(value) {
            return Err(ArchiveError::MalformedArchive(format!(
                "expected a `{}` node",
                CRYPTO_ARCHIVE_CLASS
            )));
        }
        let payload = value
            .get(PAYLOAD_KEY)
            .and_then(PrimitiveValue::as_mapping)
            .ok_or_else(|| ArchiveError::MalformedArchive("crypto archive has no payload".into()))?;

        let bytes_field = |name: &str| -> ArchiveResult<Vec<u8>> {
            payload
                .get(name)
                .and_then(PrimitiveValue::as_bytes)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| {
                    ArchiveError::MalformedArchive(format!("crypto archive field `{}` missing", name))
                })
        };

        let version = payload
            .get(VERSION_FIELD)
            .and_then(PrimitiveValue::as_f64)
            .ok_or_else(|| ArchiveError::MalformedArchive("crypto archive has no version".into()))?;
        let version = SchemeVersion::from_f64(version)?;

        let iv = bytes_field(IV_FIELD)?;
        let salt = bytes_field(SALT_FIELD)?;
        if iv.len() != IV_LEN || salt.len() != version.salt_len() {
            return Err(ArchiveError::MalformedArchive(format!(
                "crypto archive v{} expects a {}-byte iv and {}-byte salt",
                version,
                IV_LEN,
                version.salt_len()
            )));
        }

        let root_class = match payload.get(ROOT_CLASS_FIELD) {
            None | Some(PrimitiveValue::Null) => None,
            Some(value) => Some(
                value
                    .as_str()
                    .ok_or_else(|| {
                        ArchiveError::MalformedArchive("crypto archive rootClass should be text".into())
                    })?
                    .to_string(),
            ),
        };

        Ok(Self {
            iv,
            salt,
            cipher_text: bytes_field(CIPHER_FIELD)?,
            version,
            root_class,
        })
    }

    /// Whether `value` is tagged as a crypto archive node
    pub fn is_crypto_archive(value: &PrimitiveValue) -> bool {
        value.get(CLASS_KEY).and_then(PrimitiveValue::as_str) == Some(CRYPTO_ARCHIVE_CLASS)
    }
}

impl fmt::Debug for CryptoArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoArchive")
            .field("version", &self.version)
            .field("root_class", &self.root_class)
            .field("cipher_len", &self.cipher_text.len())
            .finish_non_exhaustive()
    }
}
