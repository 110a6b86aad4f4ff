//! Versioned key-derivation and cipher parameters
//!
//! Versions only ever increase. Sealing uses [`SchemeVersion::CURRENT`];
//! opening accepts everything in [`SchemeVersion::ALL`].

use crate::archive::{ArchiveError, ArchiveResult};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// AES-256 key length
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length (96 bits)
pub const IV_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum SchemeVersion {
    /// Argon2id 19 MiB / 2 passes / 1 lane, 16-byte salt
    V1,
    /// Argon2id 64 MiB / 3 passes / 4 lanes, 32-byte salt, version-bound AAD
    V2,
}

impl SchemeVersion {
    pub const CURRENT: SchemeVersion = SchemeVersion::V2;
    pub const ALL: [SchemeVersion; 2] = [SchemeVersion::V1, SchemeVersion::V2];

    pub fn as_f64(self) -> f64 {
        match self {
            SchemeVersion::V1 => 1.0,
            SchemeVersion::V2 => 2.0,
        }
    }

    pub fn from_f64(version: f64) -> ArchiveResult<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_f64() == version)
            .ok_or_else(|| ArchiveError::UnsupportedVersion(format!("crypto scheme {}", version)))
    }

    pub fn salt_len(self) -> usize {
        match self {
            SchemeVersion::V1 => 16,
            SchemeVersion::V2 => 32,
        }
    }

    /// Associated data authenticated alongside the cipher text
    pub(crate) fn aad(self) -> &'static [u8] {
        match self {
            SchemeVersion::V1 => b"",
            SchemeVersion::V2 => b"modelvault-crypto-archive/2",
        }
    }

    fn kdf_params(self) -> (u32, u32, u32) {
        match self {
            SchemeVersion::V1 => (19 * 1024, 2, 1),
            SchemeVersion::V2 => (64 * 1024, 3, 4),
        }
    }

    /// Derive the 256-bit cipher key for this version
    pub fn derive_key(self, password: &str, salt: &[u8]) -> ArchiveResult<Zeroizing<[u8; KEY_LEN]>> {
        let (memory_kib, passes, lanes) = self.kdf_params();
        let params = Params::new(memory_kib, passes, lanes, Some(KEY_LEN))
            .map_err(|e| ArchiveError::Encryption(format!("Invalid Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon2
            .hash_password_into(password.as_bytes(), salt, key.as_mut())
            .map_err(|e| ArchiveError::Encryption(format!("Key derivation failed: {}", e)))?;
        Ok(key)
    }
}

impl Default for SchemeVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl TryFrom<f64> for SchemeVersion {
    type Error = ArchiveError;

    fn try_from(version: f64) -> Result<Self, Self::Error> {
        Self::from_f64(version)
    }
}

impl From<SchemeVersion> for f64 {
    fn from(version: SchemeVersion) -> Self {
        version.as_f64()
    }
}

impl fmt::Display for SchemeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_increase() {
        assert!(SchemeVersion::V1 < SchemeVersion::V2);
        assert!(SchemeVersion::V1.as_f64() < SchemeVersion::V2.as_f64());
        assert_eq!(SchemeVersion::ALL.last(), Some(&SchemeVersion::CURRENT));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(SchemeVersion::from_f64(1.0).unwrap(), SchemeVersion::V1);
        assert_eq!(SchemeVersion::try_from(2.0).unwrap(), SchemeVersion::V2);
        assert!(matches!(
            SchemeVersion::from_f64(3.0),
            Err(ArchiveError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(SchemeVersion::V2.to_string(), "2.0");
    }

    #[test]
    fn test_key_derivation_is_deterministic_per_salt() {
        let salt = [7u8; 16];
        let a = SchemeVersion::V1.derive_key("secret", &salt).unwrap();
        let b = SchemeVersion::V1.derive_key("secret", &salt).unwrap();
        let c = SchemeVersion::V1.derive_key("secret", &[8u8; 16]).unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn test_versions_derive_different_keys() {
        let salt = [1u8; 32];
        let v1 = SchemeVersion::V1.derive_key("secret", &salt).unwrap();
        let v2 = SchemeVersion::V2.derive_key("secret", &salt).unwrap();
        assert_ne!(*v1, *v2);
    }
}
