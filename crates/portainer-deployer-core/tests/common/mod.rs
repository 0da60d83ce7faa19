// crates/portainer-deployer-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Helpers
// Description: Scratch files and sample stack documents.
// ============================================================================

//! ## Overview
//! Scratch directories and compose fixtures shared by core tests.

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

/// Minimal compose document with one service.
pub const SAMPLE_STACK: &str = "version: '3.8'\nservices:\n  web:\n    image: nginx:1.24\n    ports:\n      - '80:80'\n";
