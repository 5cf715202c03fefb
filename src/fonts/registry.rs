//! In-memory catalog of installed fonts
//!
//! The registry mirrors the managed font directory. It is never patched
//! incrementally: every mutation is followed by a full [`FontRegistry::rescan`],
//! so the catalog cannot drift from what is actually on disk, even when files
//! are changed behind the agent's back.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{FontError, Result};
use crate::fonts::validator::sniff_file;
use crate::fs_utils::normalize_path;

// FNV-1a constants for 64-bit hash
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Compute a stable FNV-1a hash
fn fnv1a_hash(data: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in data.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Compute the registry id for a font file.
///
/// Derived from the resolved path only, so the same file keeps the same id
/// across scans and restarts.
pub fn font_id(path: &Path) -> String {
    format!("{:016x}", fnv1a_hash(&path.to_string_lossy()))
}

/// A font tracked by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FontRecord {
    /// Hash of the resolved path
    #[serde(default)]
    pub id: String,
    /// Absolute path of the file
    #[serde(default)]
    pub path: String,
    /// Base name of the file
    #[serde(default, rename = "name")]
    pub display_name: String,
}

impl FontRecord {
    /// Build the record for a file inside the managed directory
    pub fn for_path(path: &Path) -> Self {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: font_id(path),
            path: path.to_string_lossy().into_owned(),
            display_name,
        }
    }
}

/// Catalog of the fonts currently present in the managed directory
pub struct FontRegistry {
    dir: PathBuf,
    fonts: RwLock<HashMap<String, FontRecord>>,
}

impl FontRegistry {
    /// Open the registry for `dir`, creating the directory when absent, and
    /// run the initial scan.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            tracing::info!("Creating font directory {}", dir.display());
            fs::create_dir_all(dir).map_err(|source| FontError::CreateFontDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let resolved = dir
            .canonicalize()
            .map(|p| normalize_path(&p))
            .map_err(|source| FontError::ScanFontDir {
                path: dir.to_path_buf(),
                source,
            })?;

        let fonts = scan(&resolved)?;
        tracing::info!(
            "Font registry has {} installed fonts in {}",
            fonts.len(),
            resolved.display()
        );

        Ok(Self {
            dir: resolved,
            fonts: RwLock::new(fonts),
        })
    }

    /// The resolved managed directory
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Find a font by id
    pub fn lookup(&self, id: &str) -> Option<FontRecord> {
        self.fonts.read().get(id).cloned()
    }

    /// Snapshot of all fonts, ordered by display name
    pub fn fonts(&self) -> Vec<FontRecord> {
        let mut list: Vec<FontRecord> = self.fonts.read().values().cloned().collect();
        list.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        list
    }

    pub fn len(&self) -> usize {
        self.fonts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.read().is_empty()
    }

    /// Rebuild the catalog from disk. Returns the new font count.
    pub fn rescan(&self) -> Result<usize> {
        // Scan outside the lock, swap under it
        let fonts = scan(&self.dir)?;
        let count = fonts.len();
        *self.fonts.write() = fonts;
        tracing::info!("Font registry rescanned: {} installed fonts", count);
        Ok(count)
    }
}

/// List `dir` and build a record for every file that sniffs as a font.
///
/// Non-font files are skipped without error.
pub fn scan(dir: &Path) -> Result<HashMap<String, FontRecord>> {
    let entries = fs::read_dir(dir).map_err(|source| FontError::ScanFontDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut fonts = HashMap::new();
    for entry in entries {
        let entry = entry.map_err(|source| FontError::ScanFontDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(entry.file_name());
        if !path.is_file() {
            continue;
        }
        if !sniff_file(&path) {
            tracing::debug!("Skipping non-font file {}", path.display());
            continue;
        }

        let record = FontRecord::for_path(&path);
        tracing::debug!("{} has id {}", record.display_name, record.id);
        fonts.insert(record.id.clone(), record);
    }

    Ok(fonts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TTF_HEADER: &[u8] = &[0x00, 0x01, 0x00, 0x00, 0x00, 0x0c, 0x00, 0x80];

    #[test]
    fn test_font_id_is_deterministic() {
        let a = font_id(Path::new("/fonts/Inter.ttf"));
        let b = font_id(Path::new("/fonts/Inter.ttf"));
        let c = font_id(Path::new("/fonts/inter.ttf"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("nested").join("fonts");

        let registry = FontRegistry::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(registry.is_empty());
        assert!(registry.fonts().is_empty());
    }

    #[test]
    fn test_scan_filters_by_content() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.ttf"), TTF_HEADER).unwrap();
        fs::write(temp.path().join("notes.txt"), "just text").unwrap();
        fs::write(temp.path().join("b.bin"), b"wOF2\x00\x01\x00\x00").unwrap();
        fs::create_dir(temp.path().join("subdir.ttf")).unwrap();

        let registry = FontRegistry::open(temp.path()).unwrap();
        let names: Vec<String> = registry
            .fonts()
            .into_iter()
            .map(|f| f.display_name)
            .collect();
        assert_eq!(names, vec!["a.ttf".to_string(), "b.bin".to_string()]);
    }

    #[test]
    fn test_records_live_inside_directory() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.ttf"), TTF_HEADER).unwrap();

        let registry = FontRegistry::open(temp.path()).unwrap();
        let record = registry.fonts().pop().unwrap();
        assert!(Path::new(&record.path).starts_with(registry.directory()));
        assert_eq!(registry.lookup(&record.id), Some(record));
    }

    #[test]
    fn test_rescan_ids_are_stable() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.ttf"), TTF_HEADER).unwrap();

        let registry = FontRegistry::open(temp.path()).unwrap();
        let before = registry.fonts();
        registry.rescan().unwrap();
        assert_eq!(before, registry.fonts());
    }

    #[test]
    fn test_rescan_tracks_out_of_band_changes() {
        let temp = tempdir().unwrap();
        let registry = FontRegistry::open(temp.path()).unwrap();
        assert_eq!(registry.len(), 0);

        fs::write(temp.path().join("late.otf"), b"OTTO\x00\x0a").unwrap();
        assert_eq!(registry.rescan().unwrap(), 1);

        fs::remove_file(temp.path().join("late.otf")).unwrap();
        assert_eq!(registry.rescan().unwrap(), 0);
    }
}
