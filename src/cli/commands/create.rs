//! `securestore create`: create a new vault.

use crate::cli::{output, resolve_key_source, unlock, vcs, Cli, KeySource};
use crate::errors::{Error, Result};
use crate::vault::store::SecretsManager;

/// Execute the `create` command.
///
/// With `--keyfile` pointing at an existing file, the key is imported;
/// with a fresh path, a new key is generated and exported there, and
/// the key path is added to the ignore file of any enclosing checkout.
pub fn execute(cli: &Cli) -> Result<()> {
    if cli.store.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("vault already exists at {}", cli.store.display()),
        )));
    }

    let mut sman = SecretsManager::new();

    match resolve_key_source(cli, true)? {
        source @ KeySource::Password(_) => unlock(&mut sman, &source)?,
        KeySource::KeyFile(path) => {
            if path.exists() {
                sman.load_key_from_file(&path)?;
            } else {
                sman.generate_key()?;
                sman.export_key(&path)?;
                output::success(&format!("Generated key file at {}", path.display()));

                if let Some(parent) = path.parent() {
                    let probe = if parent.as_os_str().is_empty() {
                        std::env::current_dir()?
                    } else {
                        parent.to_path_buf()
                    };
                    if let Some((root, ignore_file)) = vcs::find_vcs_root(&probe) {
                        let entry = vcs::ignore_entry_for(&root, &path);
                        vcs::append_ignore_entry(&root, ignore_file, &entry);
                    }
                }
            }
        }
    }

    sman.save(&cli.store)?;
    output::success(&format!("Vault created at {}", cli.store.display()));
    Ok(())
}
