// src/resolve/materialize.rs

//! Writing the bundled fallback binary to disk.
//!
//! The bytes come from `bundled_asset.rs`, a file produced by `vipser embed`
//! and compiled in with the `bundled` feature:
//!
//! ```text
//! vipser embed --module bundled --name VIPSER_LINUX_AMD64 \
//!     < vipser > src/resolve/bundled_asset.rs
//! ```
//!
//! Only Linux x86_64 has a bundled binary. Everywhere else, or without the
//! feature, materializing fails.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::verify_executable;
use crate::errors::{Result, VipserError};

/// File name the bundled binary is installed under.
pub const BUNDLED_NAME: &str = "vipser-linux-amd64";

#[cfg(all(feature = "bundled", target_os = "linux", target_arch = "x86_64"))]
include!("bundled_asset.rs");

#[cfg(all(feature = "bundled", target_os = "linux", target_arch = "x86_64"))]
fn bundled_bytes() -> Option<&'static [u8]> {
    Some(bundled::VIPSER_LINUX_AMD64)
}

#[cfg(not(all(feature = "bundled", target_os = "linux", target_arch = "x86_64")))]
fn bundled_bytes() -> Option<&'static [u8]> {
    None
}

/// Install the bundled binary into `dir` and return its path.
pub fn materialize_bundled(dir: &Path) -> Result<PathBuf> {
    match bundled_bytes() {
        Some(bytes) => install_executable(dir, BUNDLED_NAME, bytes),
        None => Err(VipserError::NotFound(format!(
            "cannot create vipser binary for {}-{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        ))),
    }
}

/// Write `bytes` to `dir/name` with mode 0755 unless that file already exists.
///
/// The content goes to a temporary file in `dir` first and is then linked
/// into place without clobbering, so two processes racing on first use end
/// up sharing whichever copy landed first.
pub fn install_executable(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let target = dir.join(name);

    if target.exists() {
        debug!(path = %target.display(), "reusing existing bundled binary");
        verify_executable(&target)?;
        return Ok(target);
    }

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o755))?;
    }

    match tmp.persist_noclobber(&target) {
        Ok(_) => {
            info!(path = %target.display(), bytes = bytes.len(), "installed bundled vipser binary");
        }
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
            debug!(path = %target.display(), "bundled binary installed concurrently; reusing it");
        }
        Err(e) => return Err(e.error.into()),
    }

    verify_executable(&target)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    #[test]
    fn installs_with_exec_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = install_executable(dir.path(), "tool", b"#!/bin/sh\nexit 0\n").unwrap();

        assert_eq!(path, dir.path().join("tool"));
        assert_eq!(std::fs::read(&path).unwrap(), b"#!/bin/sh\nexit 0\n");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let first = install_executable(dir.path(), "tool", b"first").unwrap();
        let second = install_executable(dir.path(), "tool", b"second").unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"first");
    }

    #[cfg(not(feature = "bundled"))]
    #[test]
    fn materialize_without_bundle_fails() {
        let dir = TempDir::new().unwrap();
        let err = materialize_bundled(dir.path()).unwrap_err();

        assert!(matches!(err, VipserError::NotFound(msg) if msg.contains("cannot create vipser binary")));
        assert!(!dir.path().join(BUNDLED_NAME).exists());
    }
}
