//! Single-step upgraders that advance an older vault document to the
//! current schema.
//!
//! Each step is a plain record dispatched by the document's current
//! version; the chain is applied repeatedly until the current version
//! is reached. Steps run only once key material is available, and the
//! second step needs the original password to re-derive the key under
//! the new iteration count. Errors raised inside a step are flattened
//! by the caller so no partial plaintext or step detail leaks out.

use super::blob::{EncryptedBlob, SecretName};
use super::format::{VaultDocument, CURRENT_VERSION};
use crate::crypto::buffer::SecureBuffer;
use crate::crypto::kdf::{self, PBKDF2_ROUNDS};
use crate::crypto::keys::KeyMaterial;
use crate::errors::{Error, Result};

/// Sentinel plaintext length in bytes.
pub(crate) const SENTINEL_LEN: usize = 32;

/// One upgrade step: advances a document from `from` to `to`.
struct UpgradeStep {
    from: u32,
    to: u32,
    apply: fn(&mut VaultDocument, &mut KeyMaterial, Option<&str>) -> Result<()>,
}

const STEPS: &[UpgradeStep] = &[
    UpgradeStep {
        from: 1,
        to: 2,
        apply: upgrade_v1_to_v2,
    },
    UpgradeStep {
        from: 2,
        to: 3,
        apply: upgrade_v2_to_v3,
    },
];

/// PBKDF2 iteration count for a given schema version.
pub(crate) fn rounds_for_version(version: u32) -> u32 {
    if version < 3 {
        kdf::PBKDF2_ROUNDS_LEGACY
    } else {
        PBKDF2_ROUNDS
    }
}

/// Check that a complete chain of steps exists from `version` to the
/// current schema.
pub(crate) fn validate_chain(mut version: u32) -> Result<()> {
    while version < CURRENT_VERSION {
        match STEPS.iter().find(|s| s.from == version) {
            Some(step) => version = step.to,
            None => return Err(Error::UnsupportedVersion(version)),
        }
    }
    Ok(())
}

/// Run the chain until `doc` reaches the current schema version.
///
/// `keys` is the key material the document was opened with; the
/// password is required for the step that changes derivation
/// parameters, and the step may replace `keys` with re-derived
/// material. Step failures surface uniformly as
/// [`Error::UpgradeFailure`].
pub(crate) fn run(
    doc: &mut VaultDocument,
    keys: &mut KeyMaterial,
    password: Option<&str>,
) -> Result<()> {
    while doc.version < CURRENT_VERSION {
        let step = STEPS
            .iter()
            .find(|s| s.from == doc.version)
            .ok_or(Error::UnsupportedVersion(doc.version))?;
        (step.apply)(doc, keys, password).map_err(|_| Error::UpgradeFailure)?;
        doc.version = step.to;
    }
    Ok(())
}

/// v1 → v2: values stop being JSON-typed.
///
/// Each v1 value decrypts to a JSON document: a JSON string becomes
/// the raw UTF-8 of that string, a JSON array of bytes becomes the raw
/// bytes, anything else cannot be carried forward. A sentinel is
/// created since v1 vaults predate it.
fn upgrade_v1_to_v2(
    doc: &mut VaultDocument,
    keys: &mut KeyMaterial,
    _password: Option<&str>,
) -> Result<()> {
    let mut replacements: Vec<(SecretName, EncryptedBlob)> = Vec::with_capacity(doc.secrets.len());

    for (name, blob) in &doc.secrets {
        let plaintext = blob.open(keys)?;
        let value: serde_json::Value = serde_json::from_slice(plaintext.as_slice())
            .map_err(|e| Error::InvalidVaultFormat(format!("legacy value JSON: {e}")))?;

        let raw: SecureBuffer = match value {
            serde_json::Value::String(s) => SecureBuffer::from_vec(s.into_bytes()),
            serde_json::Value::Array(items) => {
                let mut bytes = Vec::with_capacity(items.len());
                for item in items {
                    let byte = item
                        .as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| {
                            Error::InvalidVaultFormat("legacy byte array out of range".into())
                        })?;
                    bytes.push(byte);
                }
                SecureBuffer::from_vec(bytes)
            }
            _ => {
                return Err(Error::InvalidVaultFormat(
                    "legacy value is neither a string nor a byte array".into(),
                ))
            }
        };

        replacements.push((name.clone(), EncryptedBlob::seal(keys, raw.as_slice())));
    }

    for (name, blob) in replacements {
        doc.secrets.insert(name, blob);
    }
    doc.sentinel = Some(EncryptedBlob::seal(
        keys,
        SecureBuffer::random(SENTINEL_LEN).as_slice(),
    ));
    Ok(())
}

/// v2 → v3: larger salt and a higher iteration count.
///
/// Requires the original password: the old 10 000-round key decrypts
/// everything, a fresh 16-byte salt replaces the old one, and a new
/// key derived at 256 000 rounds re-encrypts every secret plus a fresh
/// sentinel. Key-file and generated keys have no password to
/// re-derive from, so they cannot take this step.
fn upgrade_v2_to_v3(
    doc: &mut VaultDocument,
    keys: &mut KeyMaterial,
    password: Option<&str>,
) -> Result<()> {
    let password = password.ok_or(Error::NoKeyLoaded)?;

    // Decrypt everything under the old key before touching the document.
    let mut plaintexts: Vec<(SecretName, SecureBuffer)> = Vec::with_capacity(doc.secrets.len());
    for (name, blob) in &doc.secrets {
        plaintexts.push((name.clone(), blob.open(keys)?));
    }
    if let Some(sentinel) = &doc.sentinel {
        sentinel.open(keys)?;
    }

    let new_salt = kdf::generate_salt();
    let new_keys = KeyMaterial::derive(password, &new_salt, PBKDF2_ROUNDS);

    doc.iv = new_salt.to_vec();
    for (name, plaintext) in plaintexts {
        doc.secrets
            .insert(name, EncryptedBlob::seal(&new_keys, plaintext.as_slice()));
    }
    doc.sentinel = Some(EncryptedBlob::seal(
        &new_keys,
        SecureBuffer::random(SENTINEL_LEN).as_slice(),
    ));
    *keys = new_keys;
    Ok(())
}
