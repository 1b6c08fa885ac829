//! Scrub-on-drop byte buffers.
//!
//! Every piece of plaintext or key material the library produces is
//! handed out in a [`SecureBuffer`]. The backing storage is a heap
//! allocation that never moves for the lifetime of the buffer, and on
//! drop the contents are overwritten with CSPRNG output before the
//! memory is released. Random bytes rather than zeros, so a scrubbed
//! region is not distinguishable from one that never held a secret.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

/// A fixed-length byte buffer that scrubs itself on drop.
///
/// There is no public mutation path other than replacing the whole
/// contents, and no `Clone`: each copy of sensitive bytes must be an
/// explicit decision.
pub struct SecureBuffer {
    bytes: Box<[u8]>,
}

impl SecureBuffer {
    /// Allocate a zero-filled buffer of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len].into_boxed_slice(),
        }
    }

    /// Allocate a buffer of `len` bytes filled from the OS CSPRNG.
    pub fn random(len: usize) -> Self {
        let mut bytes = vec![0u8; len].into_boxed_slice();
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Take ownership of `bytes`.
    ///
    /// The caller is responsible for any copies it made of the source
    /// before handing it over.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// Number of bytes in the buffer.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read access to the contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Replace the entire contents. Lengths must match.
    ///
    /// This is the only mutation the type offers; partial writes would
    /// make it too easy to leave stale secret fragments behind.
    pub fn overwrite(&mut self, src: &[u8]) {
        assert_eq!(src.len(), self.bytes.len(), "overwrite length mismatch");
        self.bytes.copy_from_slice(src);
    }

    /// Write access for the crypto layer while it fills the buffer.
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl AsRef<[u8]> for SecureBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// Equality compares in constant time: buffers hold secrets, and a
// short-circuiting comparison would leak where they diverge.
impl PartialEq for SecureBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SecureBuffer {}

impl Drop for SecureBuffer {
    fn drop(&mut self) {
        // The fill is an OS call writing through the slice, which the
        // optimizer cannot elide the way it can a plain memset.
        OsRng.fill_bytes(&mut self.bytes);
    }
}

// Never leak contents through debug formatting.
impl fmt::Debug for SecureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBuffer({} bytes)", self.bytes.len())
    }
}
