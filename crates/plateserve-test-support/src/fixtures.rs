//! Test fixtures for scratch directories and stub recognizers.

#[cfg(unix)]
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Smallest byte sequence that starts and ends like a JPEG.
pub const SAMPLE_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

/// Fresh directory removed when the guard drops.
///
/// # Errors
///
/// Returns an error when the directory cannot be created.
pub fn scratch_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("plateserve-test-")
        .tempdir()
        .context("failed to create scratch directory")
}

/// Write an executable `sh` script named `name` into `dir` whose body is `script`.
///
/// # Errors
///
/// Returns an error when the script cannot be written or marked executable.
#[cfg(unix)]
pub fn write_stub_program(dir: &Path, name: &str, script: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n"))
        .with_context(|| format!("failed to write stub program {}", path.display()))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to mark {} executable", path.display()))?;
    Ok(path)
}
