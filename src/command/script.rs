//! Named script lookup.
//!
//! Resolves a `(name, extension)` pair to the path of a script file that a
//! shell can run. Pure filesystem lookup, no process side effects.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Environment variable naming an extra directory to search for scripts.
pub const SCRIPTS_DIR_ENV: &str = "RUSTY_SHELL_SCRIPTS";

/// Resolve a named script to a full command string (its absolute path).
///
/// Search order: the directory named by `RUSTY_SHELL_SCRIPTS`, then a
/// `scripts/` directory beside the current executable. Returns `None` when
/// no matching file exists.
pub fn script_for_name(name: &str, ext: &str) -> Option<String> {
    for dir in candidate_dirs() {
        if let Some(found) = script_in_dir(&dir, name, ext) {
            return Some(found);
        }
    }
    debug!(name, ext, "no script found in any candidate directory");
    None
}

/// Same lookup rooted at an explicit directory.
pub fn script_in_dir(dir: &Path, name: &str, ext: &str) -> Option<String> {
    let path = dir.join(format!("{name}.{ext}"));
    if path.is_file() {
        Some(path.to_string_lossy().into_owned())
    } else {
        None
    }
}

fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = std::env::var_os(SCRIPTS_DIR_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            dirs.push(parent.join("scripts"));
        }
    }
    dirs
}
