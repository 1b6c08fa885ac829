//! Key material: the 256-bit working key split into a 128-bit
//! encryption key and a 128-bit authentication key.
//!
//! The two halves are distinct keys and are never handed to the
//! opposite primitive. A 32-byte source (generated, derived, or read
//! from a key file) lives in a [`SecureBuffer`] and is scrubbed as
//! soon as it has been split.

use std::fs;
use std::io::Read;
use std::path::Path;

use super::buffer::SecureBuffer;
use super::cipher::KEY_LEN;
use super::pem;
use crate::errors::{Error, Result};

/// Combined length of the two key halves in bytes.
pub const KEY_MATERIAL_LEN: usize = 2 * KEY_LEN;

/// Absolute ceiling on key file / key stream size in bytes.
///
/// A PEM-armored 32-byte key is well under 200 bytes; anything past
/// this limit is a malformed or hostile source, not a key.
pub const MAX_KEY_FILE_LEN: usize = 2048;

/// The manager's working keys: a 128-bit AES key and a 128-bit HMAC key.
pub struct KeyMaterial {
    enc: SecureBuffer,
    mac: SecureBuffer,
}

impl KeyMaterial {
    /// Generate fresh key material from the OS CSPRNG.
    pub fn generate() -> Self {
        Self {
            enc: SecureBuffer::random(KEY_LEN),
            mac: SecureBuffer::random(KEY_LEN),
        }
    }

    /// Derive key material from a password and salt via PBKDF2.
    ///
    /// `rounds` must be the iteration count of the vault schema the
    /// salt belongs to.
    pub fn derive(password: &str, salt: &[u8], rounds: u32) -> Self {
        let source = super::kdf::derive_key_bytes(password, salt, rounds);
        Self::split(source)
    }

    /// Split a 32-byte source into the encryption and MAC halves.
    ///
    /// The source buffer is consumed and scrubbed on return.
    pub(crate) fn split(source: SecureBuffer) -> Self {
        assert_eq!(source.len(), KEY_MATERIAL_LEN, "key material must be 32 bytes");
        let mut enc = SecureBuffer::zeroed(KEY_LEN);
        let mut mac = SecureBuffer::zeroed(KEY_LEN);
        enc.overwrite(&source.as_slice()[..KEY_LEN]);
        mac.overwrite(&source.as_slice()[KEY_LEN..]);
        Self { enc, mac }
    }

    /// Read key material from a file.
    ///
    /// A file of exactly 32 bytes is the legacy raw concatenation;
    /// anything longer must be PEM armor around a 32-byte payload.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read key material from a byte stream, enforcing the size ceiling.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut data = Vec::with_capacity(256);
        // Read one byte past the ceiling so oversize sources are
        // detected without draining them.
        let n = reader
            .take(MAX_KEY_FILE_LEN as u64 + 1)
            .read_to_end(&mut data)?;
        if n > MAX_KEY_FILE_LEN {
            return Err(Error::InvalidKeyFile(format!(
                "key source exceeds the {MAX_KEY_FILE_LEN}-byte ceiling"
            )));
        }
        Self::from_bytes(&data)
    }

    fn from_bytes(data: &[u8]) -> Result<Self> {
        let raw = match data.len() {
            KEY_MATERIAL_LEN => data.to_vec(),
            n if n < KEY_MATERIAL_LEN => {
                return Err(Error::InvalidKeyFile(format!(
                    "key source is {n} bytes, expected at least {KEY_MATERIAL_LEN}"
                )));
            }
            _ => {
                let text = std::str::from_utf8(data).map_err(|_| {
                    Error::InvalidKeyFile("key source is neither raw bytes nor PEM text".into())
                })?;
                let payload = pem::decode(text)?;
                if payload.len() != KEY_MATERIAL_LEN {
                    return Err(Error::InvalidKeyFile(format!(
                        "PEM payload is {} bytes, expected {KEY_MATERIAL_LEN}",
                        payload.len()
                    )));
                }
                payload
            }
        };
        Ok(Self::split(SecureBuffer::from_vec(raw)))
    }

    /// Write the key material to `path` as PEM armor.
    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        let concat = self.export_bytes();
        fs::write(path, pem::encode(concat.as_slice()))?;
        Ok(())
    }

    /// Write the key material to `writer` as PEM armor.
    pub fn export_to_writer<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        let concat = self.export_bytes();
        writer.write_all(pem::encode(concat.as_slice()).as_bytes())?;
        Ok(())
    }

    /// The raw 32-byte concatenation (encryption key then MAC key).
    pub fn export_bytes(&self) -> SecureBuffer {
        let mut out = SecureBuffer::zeroed(KEY_MATERIAL_LEN);
        out.as_mut_slice()[..KEY_LEN].copy_from_slice(self.enc.as_slice());
        out.as_mut_slice()[KEY_LEN..].copy_from_slice(self.mac.as_slice());
        out
    }

    /// The AES-128 encryption key.
    pub fn enc_key(&self) -> &[u8] {
        self.enc.as_slice()
    }

    /// The HMAC-SHA1 authentication key.
    pub fn mac_key(&self) -> &[u8] {
        self.mac.as_slice()
    }
}
