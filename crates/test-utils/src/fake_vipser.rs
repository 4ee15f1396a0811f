use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::debug;
use vipser::{ExecutablePath, Operation};

/// A shell script standing in for the real `vipser` binary.
///
/// The script lives in its own temporary directory, which is removed when
/// the value is dropped. Scripts can use `$(dirname "$0")` to leave files
/// next to themselves for the test to inspect.
pub struct FakeVipser {
    dir: TempDir,
    path: PathBuf,
}

impl FakeVipser {
    /// Write `body` after a `#!/bin/sh` line into an executable named `vipser`.
    pub fn new(body: &str) -> Result<Self> {
        Self::named("vipser", body, 0o755)
    }

    /// Like [`FakeVipser::new`] with a custom file name and mode.
    pub fn named(name: &str, body: &str, mode: u32) -> Result<Self> {
        let dir = TempDir::new().context("creating temp dir for fake vipser")?;
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n"))
            .with_context(|| format!("writing fake vipser at {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(mode))
                .with_context(|| format!("chmod {:o} {}", mode, path.display()))?;
        }

        debug!(path = %path.display(), mode = format_args!("{mode:o}"), "wrote fake vipser script");
        Ok(Self { dir, path })
    }

    /// Script that copies stdin to stdout.
    pub fn cat() -> Result<Self> {
        Self::new("exec cat")
    }

    /// Script that prints its arguments space-separated.
    pub fn echo() -> Result<Self> {
        Self::new("echo \"$@\"")
    }

    /// Script that prints `stderr` to standard error and exits with `code`.
    pub fn failing(code: i32, stderr: &str) -> Result<Self> {
        Self::new(&format!("printf '%s' '{stderr}' >&2\nexit {code}"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn executable(&self) -> Result<ExecutablePath> {
        Ok(ExecutablePath::explicit(&self.path)?)
    }

    /// An empty operation pointed at this script.
    pub fn operation(&self) -> Result<Operation<'static>> {
        Ok(Operation::with_executable(self.executable()?))
    }
}
