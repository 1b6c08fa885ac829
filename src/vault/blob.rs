//! The encrypted-blob atom and the case-insensitive secret name key.
//!
//! A blob is the triple `(iv, hmac, payload)`: a fresh random IV, an
//! HMAC-SHA1 tag over `iv || payload`, and the AES-128-CBC ciphertext.
//! Blobs serialize as base64 strings so vault files stay readable.
//! Legacy field casings from the first schema generation are accepted
//! on input via serde aliases.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::buffer::SecureBuffer;
use crate::crypto::cipher::{self, HMAC_LEN, IV_LEN};
use crate::crypto::keys::KeyMaterial;
use crate::errors::{Error, Result};

/// A stored ciphertext atom: IV, authentication tag, and payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// The random 16-byte CBC initialization vector.
    #[serde(alias = "IV", with = "super::format::base64_bytes")]
    pub iv: Vec<u8>,

    /// HMAC-SHA1 tag over `iv || payload`.
    #[serde(alias = "Hmac", alias = "HMAC", with = "super::format::base64_bytes")]
    pub hmac: Vec<u8>,

    /// AES-128-CBC ciphertext, PKCS#7 padded (a positive multiple of 16).
    #[serde(alias = "Payload", with = "super::format::base64_bytes")]
    pub payload: Vec<u8>,
}

impl EncryptedBlob {
    /// Encrypt `plaintext` under `keys` with a fresh random IV and
    /// authenticate the result.
    pub fn seal(keys: &KeyMaterial, plaintext: &[u8]) -> Self {
        let mut iv = [0u8; IV_LEN];
        crate::crypto::fill_random(&mut iv);

        let payload = cipher::encrypt(keys.enc_key(), &iv, plaintext);
        let hmac = cipher::authenticate(keys.mac_key(), &iv, &payload);

        Self {
            iv: iv.to_vec(),
            hmac: hmac.to_vec(),
            payload,
        }
    }

    /// Verify the tag, then decrypt.
    ///
    /// The MAC check runs first and in constant time; no padding or
    /// cipher work happens on a blob that fails authentication. A
    /// wrong key and a flipped payload bit both surface as
    /// [`Error::TamperedCiphertext`].
    pub fn open(&self, keys: &KeyMaterial) -> Result<SecureBuffer> {
        cipher::verify(keys.mac_key(), &self.iv, &self.payload, &self.hmac)?;

        let iv: &[u8; IV_LEN] = self
            .iv
            .as_slice()
            .try_into()
            .map_err(|_| Error::TamperedCiphertext)?;
        cipher::decrypt(keys.enc_key(), iv, &self.payload)
    }

    /// Structural sanity check used when parsing vault documents.
    pub(crate) fn validate_shape(&self) -> Result<()> {
        if self.iv.len() != IV_LEN {
            return Err(Error::InvalidVaultFormat(format!(
                "blob IV is {} bytes, expected {IV_LEN}",
                self.iv.len()
            )));
        }
        if self.hmac.len() != HMAC_LEN {
            return Err(Error::InvalidVaultFormat(format!(
                "blob HMAC is {} bytes, expected {HMAC_LEN}",
                self.hmac.len()
            )));
        }
        if self.payload.is_empty() || self.payload.len() % IV_LEN != 0 {
            return Err(Error::InvalidVaultFormat(format!(
                "blob payload is {} bytes, expected a positive multiple of {IV_LEN}",
                self.payload.len()
            )));
        }
        Ok(())
    }
}

/// A secret's name, ordered and compared case-insensitively.
///
/// Comparison folds ASCII case byte-by-byte (ordinal): `"Foo"` and
/// `"foo"` address the same secret, and on-disk output sorts the same
/// way regardless of insertion order. Full Unicode case folding is
/// deliberately not applied; that would change the schema.
#[derive(Debug, Clone, Serialize, Deserialize, Eq)]
#[serde(transparent)]
pub struct SecretName(String);

impl SecretName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as entered when the secret was first stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for SecretName {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let b = other.0.bytes().map(|b| b.to_ascii_lowercase());
        a.cmp(b)
    }
}

impl PartialOrd for SecretName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SecretName {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SecretName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}
