//! `securestore delete`: remove a secret from the vault.

use crate::cli::{output, resolve_key_source, unlock, Cli};
use crate::errors::{Error, Result};
use crate::vault::store::{SecretsManager, VaultPolicy};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, key: &str) -> Result<()> {
    let mut sman = SecretsManager::load(&cli.store, VaultPolicy::Upgrade)?;

    // The key still has to be loaded: a save rewrites the vault, and
    // rewriting must be bound to the key that created it.
    let source = resolve_key_source(cli, false)?;
    unlock(&mut sman, &source)?;

    if !sman.delete(key)? {
        return Err(Error::SecretNotFound(key.to_string()));
    }
    sman.save(&cli.store)?;

    output::success(&format!("Deleted secret '{key}'"));
    Ok(())
}
