//! `securestore set`: add or update a secret in the vault.

use std::io::{self, IsTerminal, Read};

use crate::cli::{output, resolve_key_source, unlock, Cli};
use crate::errors::{Error, Result};
use crate::vault::store::{SecretsManager, VaultPolicy};

/// Execute the `set` command.
///
/// Accepts `set NAME VALUE`, `set NAME=VALUE`, or just `set NAME` with
/// the value read from a pipe or a masked prompt.
pub fn execute(cli: &Cli, key: &str, value: Option<&str>) -> Result<()> {
    let (name, secret_value) = match value {
        Some(v) => (key.to_string(), v.to_string()),
        None => match key.split_once('=') {
            Some((name, v)) => (name.to_string(), v.to_string()),
            None => (key.to_string(), read_value_interactively(key)?),
        },
    };

    let mut sman = SecretsManager::load(&cli.store, VaultPolicy::Upgrade)?;
    let source = resolve_key_source(cli, false)?;
    unlock(&mut sman, &source)?;

    sman.set(&name, &secret_value)?;
    sman.save(&cli.store)?;

    output::success(&format!("Secret '{name}' saved to {}", cli.store.display()));
    Ok(())
}

/// Read the secret value from piped stdin or a masked prompt.
fn read_value_interactively(key: &str) -> Result<String> {
    if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf.trim_end_matches(['\r', '\n']).to_string());
    }

    dialoguer::Password::new()
        .with_prompt(format!("Value for {key}"))
        .interact()
        .map_err(|e| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("input prompt: {e}"),
            ))
        })
}
