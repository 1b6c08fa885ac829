//! SecureStore: symmetrically-encrypted secrets vaults that live in
//! version control.
//!
//! A vault is a single pretty-printed JSON file whose values are
//! individually encrypted, so diffs stay readable while the secrets
//! themselves stay opaque. The [`SecretsManager`] is the entry point:
//! create or load a vault, load key material exactly once (generated,
//! derived from a password, or imported from a key file), then get,
//! set, and delete named secrets.

pub mod cli;
pub mod codec;
pub mod crypto;
pub mod errors;
pub mod vault;

pub use codec::{BytesCodec, Codec, Utf8Codec};
pub use crypto::buffer::SecureBuffer;
pub use crypto::keys::KeyMaterial;
pub use errors::{Error, Result};
pub use vault::blob::EncryptedBlob;
pub use vault::store::{SecretsManager, VaultPolicy};
