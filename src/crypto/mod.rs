//! Cryptographic primitives for SecureStore.
//!
//! This module provides:
//! - AES-128-CBC encryption with PKCS#7 padding and HMAC-SHA1
//!   authentication (`cipher`)
//! - PBKDF2-HMAC-SHA1 password-based key derivation (`kdf`)
//! - The 256-bit working key split into encryption and MAC halves
//!   (`keys`)
//! - Scrub-on-drop byte buffers for plaintext and key material
//!   (`buffer`)
//! - PEM ASCII armor for exported key files (`pem`)

pub mod buffer;
pub mod cipher;
pub mod kdf;
pub mod keys;
pub mod pem;

// Re-export the most commonly used items so callers can write:
//   use securestore::crypto::{SecureBuffer, KeyMaterial, ...};
pub use buffer::SecureBuffer;
pub use cipher::{authenticate, decrypt, encrypt, verify, HMAC_LEN, IV_LEN};
pub use kdf::{derive_key_bytes, generate_salt, PBKDF2_ROUNDS, SALT_LEN};
pub use keys::KeyMaterial;

use rand::rngs::OsRng;
use rand::RngCore;

/// Fill `buf` with bytes from the operating system CSPRNG.
pub fn fill_random(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}
