//! Vault module: the encrypted secrets container and its manager.
//!
//! This module provides:
//! - `EncryptedBlob` and `SecretName` types (`blob`)
//! - The vault document schema and deterministic serialization (`format`)
//! - The schema upgrade chain (`upgrade`)
//! - The high-level `SecretsManager` lifecycle state machine (`store`)

pub mod blob;
pub mod format;
pub mod store;

pub(crate) mod upgrade;

// Re-export the most commonly used items.
pub use blob::{EncryptedBlob, SecretName};
pub use format::{VaultDocument, CURRENT_VERSION};
pub use store::{SecretsManager, VaultPolicy};
