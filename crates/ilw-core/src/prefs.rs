//! Persisted client-side preferences (realtime on/off) and the state directory.

use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};

const REALTIME_FILE: &str = "realtime";

/// `$XDG_STATE_HOME/ilw`, else `~/.local/state/ilw`, else `/tmp/ilw`.
pub fn state_dir() -> PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        PathBuf::from(state).join("ilw")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("state").join("ilw")
    } else {
        PathBuf::from("/tmp/ilw")
    }
}

/// `None` when never written or unreadable.
pub fn read_realtime(dir: &Path) -> Option<bool> {
    let raw = std::fs::read_to_string(dir.join(REALTIME_FILE)).ok()?;
    match raw.trim() {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

pub fn write_realtime(dir: &Path, enabled: bool) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create state directory {dir:?}: {e}"))?;
    let path = dir.join(REALTIME_FILE);
    std::fs::write(&path, if enabled { "1" } else { "0" })
        .map_err(|e| eyre!("Failed to write {path:?}: {e}"))
}
