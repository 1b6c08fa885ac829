//! Version-control hygiene for key files.
//!
//! A key file must never land in the repository next to the vault it
//! unlocks. When `create` writes a new key file inside a working copy,
//! the key path is appended to the checkout's ignore file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::output;

/// Ignore-file name per supported VCS marker directory.
const VCS_MARKERS: &[(&str, &str)] = &[(".git", ".gitignore"), (".hg", ".hgignore")];

/// Walk up from `start` looking for a version-control root.
///
/// Returns the root directory and the name of its ignore file.
pub fn find_vcs_root(start: &Path) -> Option<(PathBuf, &'static str)> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        for (marker, ignore_file) in VCS_MARKERS {
            // `.git` may be a file in worktrees and submodules.
            if current.join(marker).exists() {
                return Some((current.to_path_buf(), ignore_file));
            }
        }
        dir = current.parent();
    }
    None
}

/// Append `entry` to `<root>/<ignore_file>` if not already present.
///
/// Creates the file if it doesn't exist. Write errors are ignored;
/// the ignore entry is a convenience, not a requirement.
pub fn append_ignore_entry(root: &Path, ignore_file: &str, entry: &str) {
    let ignore_path = root.join(ignore_file);

    let existing = fs::read_to_string(&ignore_path).unwrap_or_default();

    if existing.lines().any(|line| line.trim() == entry) {
        return;
    }

    let separator = if existing.ends_with('\n') || existing.is_empty() {
        ""
    } else {
        "\n"
    };

    if fs::write(&ignore_path, format!("{existing}{separator}{entry}\n")).is_ok() {
        output::info(&format!("Added '{entry}' to {ignore_file}"));
    }
}

/// The form of `path` to write into an ignore file rooted at `root`.
///
/// Relative to the root when the path lies inside the checkout; the
/// path as given otherwise.
pub fn ignore_entry_for(root: &Path, path: &Path) -> String {
    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| match std::env::current_dir() {
            Ok(cwd) if path.is_relative() => cwd.join(path),
            _ => path.to_path_buf(),
        });
    match absolute.strip_prefix(root) {
        Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}
