//! Temporary font directory builder

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Minimal TrueType header (sfnt version 1.0, 12 tables)
pub const TTF: &[u8] = &[
    0x00, 0x01, 0x00, 0x00, 0x00, 0x0c, 0x00, 0x80, 0x00, 0x03, 0x00, 0x40,
];
/// CFF-flavoured OpenType header
pub const OTF: &[u8] = b"OTTO\x00\x0b\x00\x80\x00\x03\x00\x30";
pub const WOFF: &[u8] = b"wOFF\x00\x01\x00\x00\x00\x00\x10\x00";
pub const WOFF2: &[u8] = b"wOF2\x00\x01\x00\x00\x00\x00\x10\x00";

/// Builder for a temp tree holding a `sources/` directory (fonts a client
/// would pick) and a `fonts/` directory (the managed directory).
pub struct FontDir {
    dir: TempDir,
}

impl FontDir {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("sources")).expect("Failed to create sources");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Managed font directory (created lazily by the registry)
    pub fn fonts_path(&self) -> PathBuf {
        self.dir.path().join("fonts")
    }

    pub fn sources_path(&self) -> PathBuf {
        self.dir.path().join("sources")
    }

    /// Add a file a client could ask to install
    pub fn add_source(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.sources_path().join(name);
        fs::write(&path, bytes).expect("Failed to write source font");
        path
    }

    /// Place a file directly in the managed directory
    pub fn add_installed(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let dir = self.fonts_path();
        fs::create_dir_all(&dir).expect("Failed to create font dir");
        let path = dir.join(name);
        fs::write(&path, bytes).expect("Failed to write installed font");
        path
    }

    /// Names of the files currently in the managed directory
    pub fn installed_names(&self) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(self.fonts_path()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// Run the fontwarden binary with an isolated config file
    pub fn run_cli(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(env!("CARGO_BIN_EXE_fontwarden"))
            .current_dir(self.path())
            .env_remove("FONTWARDEN_CONFIG")
            .arg("--config")
            .arg(self.config_path())
            .args(args)
            .output()
    }

    /// Run CLI and expect success, return stdout
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            output.status.success(),
            "CLI command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run CLI and expect failure, return (exit code, stderr)
    pub fn run_cli_failure(&self, args: &[&str]) -> (Option<i32>, String) {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            !output.status.success(),
            "CLI command {:?} should have failed",
            args
        );
        (
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }
}

impl Default for FontDir {
    fn default() -> Self {
        Self::new()
    }
}
