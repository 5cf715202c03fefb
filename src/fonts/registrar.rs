//! Platform font registration
//!
//! The agent copies font files into its managed directory, but making them
//! usable by other applications is a platform concern. [`FontRegistrar`] is the
//! seam: the protocol handler only ever calls `register` after a copy and
//! `unregister` before a delete.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a [`FontRegistrar`]
#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("registering {path} failed: {message}")]
    Failed { path: PathBuf, message: String },
}

/// Platform facility that makes a font file usable system-wide, or removes it
pub trait FontRegistrar: Send + Sync {
    /// Make the font at `path` available to other applications
    fn register(&self, path: &Path) -> Result<(), RegistrarError>;

    /// Withdraw the font at `path` so its file can be deleted
    fn unregister(&self, path: &Path) -> Result<(), RegistrarError>;
}

/// Which registrar the agent runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegistrarKind {
    /// Refresh the fontconfig cache with `fc-cache`
    #[default]
    Fontconfig,
    /// Accept every call without touching the platform
    None,
}

impl RegistrarKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fontconfig" => Some(Self::Fontconfig),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fontconfig => "fontconfig",
            Self::None => "none",
        }
    }
}

/// Registrar backed by fontconfig.
///
/// fontconfig discovers fonts by directory, so registering means rebuilding
/// the cache for the font's directory. There is no per-file withdrawal: once
/// the file is deleted the font is gone, and the next refresh drops it from
/// the cache.
#[derive(Debug, Clone)]
pub struct FontconfigRegistrar {
    program: String,
}

impl FontconfigRegistrar {
    pub fn new() -> Self {
        Self {
            program: "fc-cache".to_string(),
        }
    }

    /// Use a different cache tool binary (mainly for tests)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn refresh(&self, path: &Path) -> Result<(), RegistrarError> {
        let dir = path.parent().unwrap_or(path);
        let output = Command::new(&self.program)
            .arg("-f")
            .arg(dir)
            .output()
            .map_err(|source| RegistrarError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            format!("{} exited with {}", self.program, output.status)
        } else {
            stderr.trim().to_string()
        };
        Err(RegistrarError::Failed {
            path: path.to_path_buf(),
            message,
        })
    }
}

impl Default for FontconfigRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistrar for FontconfigRegistrar {
    fn register(&self, path: &Path) -> Result<(), RegistrarError> {
        tracing::debug!("Refreshing fontconfig cache for {}", path.display());
        self.refresh(path)
    }

    fn unregister(&self, path: &Path) -> Result<(), RegistrarError> {
        tracing::debug!(
            "fontconfig has no per-file removal; {} goes away with its file",
            path.display()
        );
        Ok(())
    }
}

/// Registrar that accepts everything and does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRegistrar;

impl FontRegistrar for NullRegistrar {
    fn register(&self, path: &Path) -> Result<(), RegistrarError> {
        tracing::debug!("Null registrar: register {}", path.display());
        Ok(())
    }

    fn unregister(&self, path: &Path) -> Result<(), RegistrarError> {
        tracing::debug!("Null registrar: unregister {}", path.display());
        Ok(())
    }
}

/// Build the registrar selected in configuration
pub fn from_kind(kind: RegistrarKind) -> std::sync::Arc<dyn FontRegistrar> {
    match kind {
        RegistrarKind::Fontconfig => std::sync::Arc::new(FontconfigRegistrar::new()),
        RegistrarKind::None => std::sync::Arc::new(NullRegistrar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registrar_kind_parse() {
        assert_eq!(RegistrarKind::parse("none"), Some(RegistrarKind::None));
        assert_eq!(
            RegistrarKind::parse("fontconfig"),
            Some(RegistrarKind::Fontconfig)
        );
        assert_eq!(RegistrarKind::parse("gdi"), None);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let registrar = FontconfigRegistrar::with_program("fontwarden-no-such-binary");
        let err = registrar.register(Path::new("/tmp/a.ttf")).unwrap_err();
        assert!(matches!(err, RegistrarError::Spawn { .. }));
    }

    #[test]
    fn test_fontconfig_unregister_is_noop() {
        let registrar = FontconfigRegistrar::with_program("fontwarden-no-such-binary");
        assert!(registrar.unregister(Path::new("/tmp/a.ttf")).is_ok());
    }
}
