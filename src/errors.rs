use thiserror::Error;

/// All errors that can occur in SecureStore.
#[derive(Debug, Error)]
pub enum Error {
    // --- Lifecycle errors ---
    #[error("No vault is loaded — the manager was disposed or never initialized")]
    NoStoreLoaded,

    #[error("No key material loaded — generate, derive, or import a key first")]
    NoKeyLoaded,

    #[error("Key material has already been loaded into this manager")]
    KeyAlreadyLoaded,

    // --- Crypto errors ---
    #[error("Decryption failed — wrong key or tampered ciphertext")]
    TamperedCiphertext,

    #[error("Invalid key file: {0}")]
    InvalidKeyFile(String),

    // --- Vault errors ---
    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    #[error("Invalid secret name: {0}")]
    InvalidSecretName(String),

    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    #[error("Unsupported vault schema version {0}")]
    UnsupportedVersion(u32),

    #[error("Vault schema version {0} is outdated and the version policy forbids upgrades")]
    PolicyViolation(u32),

    #[error("Vault upgrade failed")]
    UpgradeFailure,

    // --- Value encoding errors ---
    #[error("Value encoding error: {0}")]
    ValueEncoding(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for SecureStore results.
pub type Result<T> = std::result::Result<T, Error>;
