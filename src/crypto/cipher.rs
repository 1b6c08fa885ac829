//! AES-128-CBC encryption with PKCS#7 padding and HMAC-SHA1
//! authentication, in encrypt-then-MAC composition.
//!
//! Encryption generates a fresh random 16-byte IV per call; the MAC tag
//! covers `iv || ciphertext` in that order. Verification recomputes the
//! tag and compares in constant time before any decryption or padding
//! work happens, so "wrong key" and "flipped bit" are observationally
//! the same failure.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use super::buffer::SecureBuffer;
use crate::errors::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha1 = Hmac<Sha1>;

/// AES block size and IV length in bytes.
pub const IV_LEN: usize = 16;

/// HMAC-SHA1 tag length in bytes.
pub const HMAC_LEN: usize = 20;

/// AES-128 / HMAC-SHA1 key length in bytes.
pub const KEY_LEN: usize = 16;

/// Encrypt `plaintext` under `enc_key` with the given IV.
///
/// The output length is always a positive multiple of 16: PKCS#7 pads
/// an empty plaintext to a full block.
pub fn encrypt(enc_key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Vec<u8> {
    Aes128CbcEnc::new_from_slices(enc_key, iv)
        .expect("AES-128 key and IV are 16 bytes")
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt `payload` under `enc_key` with the given IV and strip the
/// PKCS#7 padding.
///
/// Only call this after [`verify`] has accepted the tag; a padding
/// failure here still surfaces as the same error so the two paths are
/// not distinguishable.
pub fn decrypt(enc_key: &[u8], iv: &[u8; IV_LEN], payload: &[u8]) -> Result<SecureBuffer> {
    let plaintext = Aes128CbcDec::new_from_slices(enc_key, iv)
        .expect("AES-128 key and IV are 16 bytes")
        .decrypt_padded_vec_mut::<Pkcs7>(payload)
        .map_err(|_| Error::TamperedCiphertext)?;
    Ok(SecureBuffer::from_vec(plaintext))
}

/// Compute the HMAC-SHA1 tag over `iv || payload`.
pub fn authenticate(mac_key: &[u8], iv: &[u8], payload: &[u8]) -> [u8; HMAC_LEN] {
    let mut mac = HmacSha1::new_from_slice(mac_key).expect("HMAC accepts any key length");
    mac.update(iv);
    mac.update(payload);
    mac.finalize().into_bytes().into()
}

/// Verify an HMAC-SHA1 tag over `iv || payload`.
///
/// `Mac::verify_slice` rejects on length mismatch and compares the tag
/// in constant time. Any failure is reported as tampered ciphertext.
pub fn verify(mac_key: &[u8], iv: &[u8], payload: &[u8], tag: &[u8]) -> Result<()> {
    let mut mac = HmacSha1::new_from_slice(mac_key).expect("HMAC accepts any key length");
    mac.update(iv);
    mac.update(payload);
    mac.verify_slice(tag).map_err(|_| Error::TamperedCiphertext)
}
