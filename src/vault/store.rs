//! The secrets manager: lifecycle state machine and library-level API.
//!
//! A manager is created over a fresh vault (`new`) or an existing one
//! (`load`), receives key material exactly once (generated, imported,
//! or derived from a password), and thereafter mediates every get, set,
//! and delete through the crypto layer. A manager is not safe for
//! concurrent mutation; callers serialize access themselves.

use std::io::{Read, Write};
use std::path::Path;

use super::blob::{EncryptedBlob, SecretName};
use super::format::{VaultDocument, CURRENT_VERSION};
use super::upgrade;
use crate::codec::Codec;
use crate::crypto::buffer::SecureBuffer;
use crate::crypto::keys::KeyMaterial;
use crate::errors::{Error, Result};

/// What to do when `load` meets a vault written by an older schema.
///
/// The library default is `Strict`; the CLI opts into `Upgrade`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VaultPolicy {
    /// Refuse to load older vaults.
    #[default]
    Strict,
    /// Upgrade older vaults in memory once key material is available.
    Upgrade,
}

/// The vault lifecycle manager.
///
/// ```no_run
/// use securestore::SecretsManager;
///
/// # fn main() -> securestore::Result<()> {
/// let mut sman = SecretsManager::new();
/// sman.load_key_from_password("correct horse battery staple")?;
/// sman.set("db/password", "hunter2")?;
/// sman.save("secrets.json")?;
/// # Ok(())
/// # }
/// ```
pub struct SecretsManager {
    /// `None` once the manager has been disposed.
    vault: Option<VaultDocument>,

    /// Key material, loadable exactly once.
    keys: Option<KeyMaterial>,

    /// Whether the sentinel has been proven against the loaded key.
    /// Fresh vaults start verified (their sentinel is created by us).
    sentinel_verified: bool,

    /// Set when `load` accepted an older schema under `Upgrade`.
    upgrade_pending: bool,
}

impl SecretsManager {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a manager over a brand-new empty vault.
    ///
    /// A fresh 16-byte salt is generated; nothing touches the
    /// filesystem until [`save`](Self::save).
    pub fn new() -> Self {
        Self {
            vault: Some(VaultDocument::new()),
            keys: None,
            sentinel_verified: true,
            upgrade_pending: false,
        }
    }

    /// Load a vault from `path`.
    pub fn load(path: impl AsRef<Path>, policy: VaultPolicy) -> Result<Self> {
        Self::from_document(VaultDocument::from_file(path.as_ref())?, policy)
    }

    /// Load a vault from a byte source.
    pub fn load_from<R: Read>(reader: R, policy: VaultPolicy) -> Result<Self> {
        Self::from_document(VaultDocument::from_reader(reader)?, policy)
    }

    fn from_document(doc: VaultDocument, policy: VaultPolicy) -> Result<Self> {
        if doc.version == 0 || doc.version > CURRENT_VERSION {
            return Err(Error::UnsupportedVersion(doc.version));
        }

        let upgrade_pending = if doc.version < CURRENT_VERSION {
            if policy == VaultPolicy::Strict {
                return Err(Error::PolicyViolation(doc.version));
            }
            // Surface a broken chain at load time rather than at the
            // first key load.
            upgrade::validate_chain(doc.version)?;
            true
        } else {
            false
        };

        Ok(Self {
            vault: Some(doc),
            keys: None,
            sentinel_verified: false,
            upgrade_pending,
        })
    }

    // ------------------------------------------------------------------
    // Key material lifecycle
    // ------------------------------------------------------------------

    /// Generate fresh key material from the OS CSPRNG.
    pub fn generate_key(&mut self) -> Result<()> {
        self.ensure_keyless()?;
        let keys = KeyMaterial::generate();
        self.install_keys(keys, None)
    }

    /// Import key material from a key file (raw 32 bytes or PEM).
    pub fn load_key_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_keyless()?;
        let keys = KeyMaterial::from_file(path.as_ref())?;
        self.install_keys(keys, None)
    }

    /// Import key material from a byte stream (2 KiB ceiling).
    pub fn load_key_from_stream<R: Read>(&mut self, reader: R) -> Result<()> {
        self.ensure_keyless()?;
        let keys = KeyMaterial::from_reader(reader)?;
        self.install_keys(keys, None)
    }

    /// Derive key material from a password and the vault's salt.
    ///
    /// The iteration count is the one pinned by the loaded vault's
    /// schema version, so a password that wrote a v2 vault still opens
    /// it before the upgrade re-derives at the current count.
    pub fn load_key_from_password(&mut self, password: &str) -> Result<()> {
        self.ensure_keyless()?;
        let doc = self.document()?;
        let rounds = upgrade::rounds_for_version(doc.version);
        let keys = KeyMaterial::derive(password, &doc.iv, rounds);
        self.install_keys(keys, Some(password))
    }

    /// Apply any pending upgrade, then adopt the keys.
    ///
    /// On upgrade failure the manager is left exactly as it was:
    /// keyless, document untouched.
    fn install_keys(&mut self, mut keys: KeyMaterial, password: Option<&str>) -> Result<()> {
        if self.upgrade_pending {
            let mut working = self.document()?.clone();
            upgrade::run(&mut working, &mut keys, password)?;
            self.vault = Some(working);
            self.upgrade_pending = false;
            // The upgrade re-created the sentinel under these keys.
            self.sentinel_verified = true;
        }
        self.keys = Some(keys);
        Ok(())
    }

    /// Export the key material to `path` as PEM armor.
    pub fn export_key(&self, path: impl AsRef<Path>) -> Result<()> {
        self.key_material()?.export_to_file(path.as_ref())
    }

    /// Export the key material to a writer as PEM armor.
    pub fn export_key_to_writer<W: Write>(&self, writer: W) -> Result<()> {
        self.key_material()?.export_to_writer(writer)
    }

    /// Export the raw 32-byte key concatenation.
    pub fn export_key_bytes(&self) -> Result<SecureBuffer> {
        Ok(self.key_material()?.export_bytes())
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    /// Decrypt a secret as a UTF-8 string.
    pub fn get(&self, name: &str) -> Result<String> {
        let plaintext = self.get_bytes(name)?;
        String::from_utf8(plaintext.as_slice().to_vec())
            .map_err(|_| Error::ValueEncoding(format!("secret '{name}' is not valid UTF-8")))
    }

    /// Decrypt a secret as raw bytes.
    pub fn get_bytes(&self, name: &str) -> Result<SecureBuffer> {
        let doc = self.document()?;
        let keys = self.key_material()?;
        let blob = doc
            .secrets
            .get(&SecretName::from(name))
            .ok_or_else(|| Error::SecretNotFound(name.to_string()))?;
        blob.open(keys)
    }

    /// Decrypt a secret through an injected codec.
    pub fn get_with<T, C: Codec<T>>(&self, name: &str, codec: &C) -> Result<T> {
        let plaintext = self.get_bytes(name)?;
        codec.decode(plaintext.as_slice())
    }

    /// Like [`get`](Self::get), but a missing name is `Ok(None)`.
    pub fn try_get(&self, name: &str) -> Result<Option<String>> {
        match self.get(name) {
            Ok(value) => Ok(Some(value)),
            Err(Error::SecretNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Like [`get_bytes`](Self::get_bytes), but a missing name is `Ok(None)`.
    pub fn try_get_bytes(&self, name: &str) -> Result<Option<SecureBuffer>> {
        match self.get_bytes(name) {
            Ok(value) => Ok(Some(value)),
            Err(Error::SecretNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Encrypt and store a string value, replacing any prior blob
    /// under the same (case-insensitive) name.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        self.set_bytes(name, value.as_bytes())
    }

    /// Encrypt and store a binary value.
    pub fn set_bytes(&mut self, name: &str, value: &[u8]) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSecretName("name cannot be empty".into()));
        }
        self.establish_sentinel()?;

        let keys = self.keys.as_ref().ok_or(Error::NoKeyLoaded)?;
        let blob = EncryptedBlob::seal(keys, value);
        self.vault
            .as_mut()
            .ok_or(Error::NoStoreLoaded)?
            .secrets
            .insert(SecretName::from(name), blob);
        Ok(())
    }

    /// Encrypt and store a value through an injected codec.
    pub fn set_with<T, C: Codec<T>>(&mut self, name: &str, value: &T, codec: &C) -> Result<()> {
        let bytes = codec.encode(value)?;
        self.set_bytes(name, &bytes)
    }

    /// Remove a secret. Returns whether the name existed.
    ///
    /// Deletion is a pure map operation and needs no key material.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let doc = self.document_mut()?;
        Ok(doc.secrets.remove(&SecretName::from(name)).is_some())
    }

    /// The stored secret names in case-insensitive sorted order.
    pub fn keys(&self) -> Result<Vec<&str>> {
        Ok(self
            .document()?
            .secrets
            .keys()
            .map(SecretName::as_str)
            .collect())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the vault to `path` in its canonical textual form,
    /// truncating any existing file.
    ///
    /// Requires key material: a sentinel is created first if none
    /// exists, so every saved vault carries proof of its key.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.prepare_save()?;
        self.document()?.write_to_file(path.as_ref())
    }

    /// Write the vault to a byte sink in its canonical textual form.
    pub fn save_to_writer<W: Write>(&mut self, writer: W) -> Result<()> {
        self.prepare_save()?;
        self.document()?.write_to(writer)
    }

    fn prepare_save(&mut self) -> Result<()> {
        self.key_material()?;
        if self.document()?.sentinel.is_none() {
            self.establish_sentinel()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Scrub and release key material and the vault document.
    ///
    /// Disposal is absorbing: every later operation fails. Dropping
    /// the manager scrubs the same state implicitly.
    pub fn dispose(&mut self) {
        self.keys = None;
        self.vault = None;
        self.sentinel_verified = false;
        self.upgrade_pending = false;
    }

    // ------------------------------------------------------------------
    // Internal state checks
    // ------------------------------------------------------------------

    fn document(&self) -> Result<&VaultDocument> {
        self.vault.as_ref().ok_or(Error::NoStoreLoaded)
    }

    fn document_mut(&mut self) -> Result<&mut VaultDocument> {
        self.vault.as_mut().ok_or(Error::NoStoreLoaded)
    }

    fn key_material(&self) -> Result<&KeyMaterial> {
        self.document()?;
        self.keys.as_ref().ok_or(Error::NoKeyLoaded)
    }

    fn ensure_keyless(&self) -> Result<()> {
        self.document()?;
        if self.keys.is_some() {
            return Err(Error::KeyAlreadyLoaded);
        }
        Ok(())
    }

    /// Prove or create the sentinel, at most once per manager.
    ///
    /// A loaded vault's sentinel must decrypt under the present key
    /// before the first write; a vault without one gets a fresh
    /// sentinel so later opens can make the same check.
    fn establish_sentinel(&mut self) -> Result<()> {
        let doc = self.vault.as_mut().ok_or(Error::NoStoreLoaded)?;
        let keys = self.keys.as_ref().ok_or(Error::NoKeyLoaded)?;

        match &doc.sentinel {
            Some(sentinel) => {
                if !self.sentinel_verified {
                    sentinel.open(keys)?;
                    self.sentinel_verified = true;
                }
            }
            None => {
                let plaintext = SecureBuffer::random(upgrade::SENTINEL_LEN);
                doc.sentinel = Some(EncryptedBlob::seal(keys, plaintext.as_slice()));
                self.sentinel_verified = true;
            }
        }
        Ok(())
    }
}

impl Default for SecretsManager {
    fn default() -> Self {
        Self::new()
    }
}
