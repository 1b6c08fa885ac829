//! Password-based key derivation using PBKDF2-HMAC-SHA1.
//!
//! The iteration count is pinned per vault schema version so that the
//! same password and salt always reproduce the same key for a given
//! vault. The 32-byte output is split elsewhere into an encryption
//! half and an authentication half.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha1::Sha1;

use super::buffer::SecureBuffer;

/// Length of a freshly generated salt in bytes.
pub const SALT_LEN: usize = 16;

/// Length of the derived key material in bytes (two 128-bit keys).
pub const DERIVED_LEN: usize = 32;

/// PBKDF2 iteration count for the current schema version.
pub const PBKDF2_ROUNDS: u32 = 256_000;

/// PBKDF2 iteration count used by the first two schema generations.
pub const PBKDF2_ROUNDS_LEGACY: u32 = 10_000;

/// Derive 32 bytes of key material from a password and salt.
///
/// The password is taken as UTF-8 bytes; `rounds` must match the
/// schema version of the vault the salt came from.
pub fn derive_key_bytes(password: &str, salt: &[u8], rounds: u32) -> SecureBuffer {
    let mut out = SecureBuffer::zeroed(DERIVED_LEN);
    pbkdf2_hmac::<Sha1>(password.as_bytes(), salt, rounds, out.as_mut_slice());
    out
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}
