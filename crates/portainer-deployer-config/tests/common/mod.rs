// crates/portainer-deployer-config/tests/common/mod.rs
// ============================================================================
// Module: Config Test Helpers
// Description: Shared fixtures for settings file tests.
// ============================================================================

//! ## Overview
//! Scratch directories and settings files shared by config tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Creates a scratch directory removed on drop.
pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Writes `content` to `name` inside `dir` and returns the full path.
pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

/// A complete settings file for the `PORTAINER` section.
pub const SAMPLE_SETTINGS: &str = r#"
[PORTAINER]
url = "https://portainer.example.com"
port = "9443"
token = "ptr_secret"
ssl = "false"
"#;
