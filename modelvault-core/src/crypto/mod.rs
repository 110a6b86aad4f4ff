/*
    crypto - Password-sealed archive container

    Encrypted value layout (a regular object node, storable through any codec):
    {
        "$class": "CryptoArchive",
        "$payload": {
            "cipher":    bytes   AES-256-GCM cipher text + tag
            "iv":        bytes   12-byte nonce
            "rootClass": text    wire name of the sealed root, for diagnostics
            "salt":      bytes   Argon2id salt (length depends on version)
            "version":   float   scheme version
        }
    }
*/

pub mod container;
pub mod scheme;

pub use container::{CryptoArchive, CRYPTO_ARCHIVE_CLASS};
pub use scheme::{SchemeVersion, IV_LEN, KEY_LEN};
