//! Cross-platform filesystem utilities
//!
//! This module provides helpers that work correctly on both Unix and Windows:
//! - `normalize_path`: Strips Windows `\\?\` prefix from canonicalized paths
//! - `atomic_rename`: Handles atomic file replacement (Windows requires explicit delete)
//! - `default_font_dir`: Returns the per-user managed font directory
//! - `config_file_path`: Returns the platform-appropriate config file location

use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "fontwarden";

/// Normalize Windows paths by removing the `\\?\` prefix if present.
///
/// Font ids are hashed from the resolved path, so the prefix would change ids
/// depending on how the directory was resolved. No-op on Unix.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use fontwarden::fs_utils::normalize_path;
///
/// let path = PathBuf::from("/home/user/fonts");
/// assert_eq!(normalize_path(&path), path);
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        let s = path.to_string_lossy();
        // Handle UNC paths: \\?\UNC\server\share -> \\server\share
        if let Some(stripped) = s.strip_prefix(r"\\?\UNC\") {
            return PathBuf::from(format!(r"\\{}", stripped));
        }
        // Handle local paths: \\?\C:\path -> C:\path
        if let Some(stripped) = s.strip_prefix(r"\\?\") {
            return PathBuf::from(stripped);
        }
    }
    path.to_path_buf()
}

/// Cross-platform atomic rename that handles Windows file replacement.
///
/// On Unix, `fs::rename` atomically replaces the target if it exists.
/// On Windows, `fs::rename` fails if the target exists, so the target is
/// deleted first.
pub fn atomic_rename(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
    }
    std::fs::rename(src, dst)
}

/// Write `contents` to `path` through a sibling temp file and a rename
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, contents)?;
    atomic_rename(&temp_path, path)
}

/// Per-user directory holding the fonts managed by the agent.
///
/// - Linux: `~/.local/share/fontwarden/fonts`
/// - macOS: `~/Library/Application Support/fontwarden/fonts`
/// - Windows: `%LOCALAPPDATA%\fontwarden\fonts`
///
/// Falls back to the temp directory when no data directory is known.
pub fn default_font_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("fonts")
}

/// Location of the agent's config file
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("config.toml")
}
