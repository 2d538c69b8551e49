//! Small helpers shared across the crate.

use std::path::PathBuf;

/// The user's configuration directory, per the XDG base directory spec.
///
/// `$XDG_CONFIG_HOME` wins; without it, `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}
