//! `securestore get`: decrypt and print secrets.
//!
//! The decrypted value is the only thing written to stdout, so the
//! command composes: `export TOKEN=$(securestore get -s v.json token)`.

use crate::cli::{resolve_key_source, unlock, Cli, OutputFormat};
use crate::errors::{Error, Result};
use crate::vault::store::{SecretsManager, VaultPolicy};

/// Execute the `get` command.
pub fn execute(cli: &Cli, key: Option<&str>, all: bool, format: OutputFormat) -> Result<()> {
    let mut sman = SecretsManager::load(&cli.store, VaultPolicy::Upgrade)?;
    let source = resolve_key_source(cli, false)?;
    unlock(&mut sman, &source)?;

    if all {
        return print_all(&sman, format);
    }

    let key = key.ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "a secret name is required unless --all is given",
        ))
    })?;

    let value = sman.get(key)?;
    println!("{value}");
    Ok(())
}

/// Decrypt every secret and render the chosen format to stdout.
fn print_all(sman: &SecretsManager, format: OutputFormat) -> Result<()> {
    let names: Vec<String> = sman.keys()?.iter().map(|n| n.to_string()).collect();

    match format {
        OutputFormat::Json => {
            let mut object = serde_json::Map::with_capacity(names.len());
            for name in names {
                let value = sman.get(&name)?;
                object.insert(name, serde_json::Value::String(value));
            }
            let rendered = serde_json::to_string_pretty(&serde_json::Value::Object(object))
                .expect("string map always serializes");
            println!("{rendered}");
        }
        OutputFormat::Text => {
            for name in names {
                let value = sman.get(&name)?;
                println!("{name}={value}");
            }
        }
    }
    Ok(())
}
