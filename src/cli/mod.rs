//! CLI module: clap argument parser, password prompting, and the
//! command implementations.

pub mod commands;
pub mod output;
pub mod vcs;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use zeroize::Zeroizing;

use crate::errors::{Error, Result};
use crate::vault::store::SecretsManager;

/// SecureStore CLI: encrypted secrets vaults for your repository.
#[derive(Parser)]
#[command(
    name = "securestore",
    about = "Manage symmetrically-encrypted secrets vaults",
    version,
    disable_version_flag = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print version
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Path to the secrets vault
    #[arg(
        short = 's',
        long = "store",
        default_value = "secrets.json",
        global = true,
        value_name = "PATH"
    )]
    pub store: PathBuf,

    /// Unlock with a password (prompts when no value is given)
    #[arg(short, long, global = true, value_name = "PASSWORD")]
    pub password: Option<Option<String>>,

    /// Unlock with a key file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub keyfile: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new empty vault
    Create,

    /// Add or update a secret
    Set {
        /// Secret name, or NAME=VALUE in one argument
        key: String,
        /// Secret value (omit for interactive prompt)
        value: Option<String>,
    },

    /// Decrypt and print a secret's value
    Get {
        /// Secret name
        key: Option<String>,

        /// Decrypt every secret in the vault
        #[arg(short, long)]
        all: bool,

        /// Output format for --all
        #[arg(short = 't', long = "output-format", value_enum, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Remove a secret
    Delete {
        /// Secret name
        key: String,
    },
}

/// How `get --all` renders the decrypted vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// A JSON object of name/value pairs
    Json,
    /// NAME=VALUE lines
    Text,
}

/// Where the vault key comes from for this invocation.
pub enum KeySource {
    Password(Zeroizing<String>),
    KeyFile(PathBuf),
}

/// Resolve the key source from the global flags.
///
/// A key file wins over a password; with neither flag, or with a bare
/// `-p`, the password is prompted for on stderr. `confirm` requests a
/// second confirmation prompt (used when creating a vault, where a
/// typo would be unrecoverable).
pub fn resolve_key_source(cli: &Cli, confirm: bool) -> Result<KeySource> {
    if let Some(path) = &cli.keyfile {
        return Ok(KeySource::KeyFile(path.clone()));
    }

    if let Some(Some(inline)) = &cli.password {
        if !inline.is_empty() {
            output::warning("Password provided on the command line — it may appear in shell history.");
            return Ok(KeySource::Password(Zeroizing::new(inline.clone())));
        }
    }

    let prompt = dialoguer::Password::new().with_prompt("Vault password");
    let prompt = if confirm {
        prompt.with_confirmation("Confirm vault password", "Passwords do not match, try again")
    } else {
        prompt
    };
    let password = prompt
        .interact()
        .map_err(|e| Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("password prompt: {e}"),
        )))?;
    Ok(KeySource::Password(Zeroizing::new(password)))
}

/// Load key material into `sman` from the resolved source.
pub fn unlock(sman: &mut SecretsManager, source: &KeySource) -> Result<()> {
    match source {
        KeySource::Password(password) => sman.load_key_from_password(password),
        KeySource::KeyFile(path) => sman.load_key_from_file(path),
    }
}
