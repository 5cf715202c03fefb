//! Error types and exit codes for fontwarden

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

use crate::fonts::registrar::RegistrarError;

/// Main error type for fontwarden operations
#[derive(Error, Debug)]
pub enum FontError {
    #[error("could not create font directory {path}: {source}")]
    CreateFontDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read font directory {path}: {source}")]
    ScanFontDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid listen address '{value}'")]
    InvalidAddress { value: String },

    #[error("configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error at {path}: {message}")]
    IoError { path: PathBuf, message: String },

    #[error(transparent)]
    Registrar(#[from] RegistrarError),

    #[error("background task failed: {message}")]
    Task { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FontError {
    /// Convert error to an exit code:
    /// - 0: Success
    /// - 1: IO error
    /// - 2: Configuration error
    /// - 3: Font directory unusable
    /// - 4: Listener could not start
    /// - 5: Font registrar failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::IoError { .. } | Self::Io(_) | Self::Task { .. } => ExitCode::from(1),
            Self::ConfigError { .. } | Self::InvalidAddress { .. } => ExitCode::from(2),
            Self::CreateFontDir { .. } | Self::ScanFontDir { .. } => ExitCode::from(3),
            Self::Bind { .. } => ExitCode::from(4),
            Self::Registrar(_) => ExitCode::from(5),
        }
    }
}

/// Result type alias for fontwarden operations
pub type Result<T> = std::result::Result<T, FontError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registrar_error_is_transparent() {
        let err: FontError = RegistrarError::Failed {
            path: PathBuf::from("/tmp/fonts/a.ttf"),
            message: "fc-cache exited with status 1".to_string(),
        }
        .into();
        assert!(err.to_string().contains("fc-cache exited with status 1"));
    }

    #[test]
    fn test_display_includes_path() {
        let err = FontError::CreateFontDir {
            path: PathBuf::from("/tmp/fonts"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/tmp/fonts"));
    }
}
