//! Vault document schema and deterministic on-disk serialization.
//!
//! A vault file is a single pretty-printed JSON object with members in
//! a fixed order (`version`, `iv`, `sentinel`, `secrets`), two-space
//! indentation, `\n` line terminators, and secrets sorted by
//! case-insensitive name. Editing one secret therefore touches only
//! its own lines in a diff.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::blob::{EncryptedBlob, SecretName};
use crate::errors::{Error, Result};

/// Current vault schema version.
pub const CURRENT_VERSION: u32 = 3;

/// The serializable vault container.
///
/// `iv` is the vault-level PBKDF2 salt (16 bytes at the current
/// schema, 8 in the first two generations); it is unrelated to the
/// per-blob IVs. Legacy field casings are accepted on input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultDocument {
    /// Schema version of this document.
    #[serde(alias = "Version")]
    pub version: u32,

    /// PBKDF2 salt for password-derived keys.
    #[serde(alias = "IV", with = "base64_bytes")]
    pub iv: Vec<u8>,

    /// Proof-of-key blob created at vault-creation time.
    #[serde(
        alias = "Sentinel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sentinel: Option<EncryptedBlob>,

    /// Name-to-blob map, kept sorted by case-insensitive name.
    #[serde(alias = "Secrets", default)]
    pub secrets: BTreeMap<SecretName, EncryptedBlob>,
}

impl VaultDocument {
    /// A fresh, empty document at the current schema version with a
    /// newly generated salt.
    pub fn new() -> Self {
        Self {
            version: CURRENT_VERSION,
            iv: crate::crypto::kdf::generate_salt().to_vec(),
            sentinel: None,
            secrets: BTreeMap::new(),
        }
    }

    /// Parse a document from raw bytes and validate its structure.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let doc: VaultDocument = serde_json::from_slice(data)
            .map_err(|e| Error::InvalidVaultFormat(format!("vault JSON: {e}")))?;
        doc.validate_shape()?;
        Ok(doc)
    }

    /// Parse a document from a byte source.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_slice(&data)
    }

    /// Read and parse the document at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_slice(&fs::read(path)?)
    }

    /// Render the canonical textual form: pretty-printed, two-space
    /// indent, fixed member order, trailing newline.
    pub fn to_canonical_string(&self) -> String {
        let mut text = serde_json::to_string_pretty(self)
            .expect("vault documents always serialize to JSON");
        text.push('\n');
        text
    }

    /// Write the canonical form to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.to_canonical_string().as_bytes())?;
        Ok(())
    }

    /// Write the canonical form to `path`, truncating any prior file.
    ///
    /// Callers who need crash atomicity should write to a temporary
    /// file and rename it over the target themselves.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_canonical_string())?;
        Ok(())
    }

    fn validate_shape(&self) -> Result<()> {
        if let Some(sentinel) = &self.sentinel {
            sentinel.validate_shape()?;
        }
        for (name, blob) in &self.secrets {
            if name.as_str().is_empty() {
                return Err(Error::InvalidVaultFormat(
                    "secret names must be non-empty".into(),
                ));
            }
            blob.validate_shape()?;
        }
        Ok(())
    }
}

impl Default for VaultDocument {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Serde helper for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(&s).map_err(serde::de::Error::custom)
    }
}
