// src/resolve/mod.rs

//! Locating and verifying the external `vipser` executable.
//!
//! Candidates are tried in a fixed order and the first one that is *present*
//! decides the outcome:
//!
//! 1. a compiled-in default (`VIPSER_DEFAULT_PATH` at build time),
//! 2. the `VIPSER` environment variable,
//! 3. an executable named `vipser` on `PATH`,
//! 4. `vipser` in the current working directory.
//!
//! A present candidate that fails verification is the resolution error; the
//! resolver does not move on to the next candidate. When the working
//! directory itself cannot be determined, the bundled binary is written out
//! instead (see [`materialize`]).

pub mod materialize;

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, VipserError};

pub use materialize::{BUNDLED_NAME, install_executable, materialize_bundled};

/// File name looked up on `PATH` and in the working directory.
pub const EXECUTABLE_NAME: &str = "vipser";

/// Environment variable overriding the executable path.
pub const ENV_OVERRIDE: &str = "VIPSER";

/// Build-time default, e.g. `VIPSER_DEFAULT_PATH=/opt/vipser/bin/vipser cargo build`.
const COMPILED_DEFAULT: Option<&str> = option_env!("VIPSER_DEFAULT_PATH");

/// Where a resolved executable came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    CompiledDefault,
    Environment,
    SearchPath,
    WorkingDirectory,
    Bundled,
    /// Given directly by the caller (config file, CLI flag, tests).
    Explicit,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolutionSource::CompiledDefault => "compiled-in default",
            ResolutionSource::Environment => "VIPSER environment variable",
            ResolutionSource::SearchPath => "PATH",
            ResolutionSource::WorkingDirectory => "working directory",
            ResolutionSource::Bundled => "bundled binary",
            ResolutionSource::Explicit => "explicit path",
        };
        f.write_str(s)
    }
}

/// A resolved executable. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutablePath {
    path: PathBuf,
    source: ResolutionSource,
}

impl ExecutablePath {
    /// Verify `path` and use it as-is.
    pub fn explicit(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        verify_executable(&path)?;
        Ok(Self {
            path,
            source: ResolutionSource::Explicit,
        })
    }

    /// A bare program name left for the OS to look up when spawning.
    ///
    /// No verification happens here; a missing program surfaces as a start
    /// error when the operation runs.
    pub fn program(name: impl Into<PathBuf>) -> Self {
        Self {
            path: name.into(),
            source: ResolutionSource::Explicit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> ResolutionSource {
        self.source
    }
}

impl fmt::Display for ExecutablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Check that `path` exists, is not a directory and has an exec bit set.
pub fn verify_executable(path: &Path) -> Result<()> {
    let invalid = |reason: &str| VipserError::Resolution {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let meta = std::fs::metadata(path).map_err(|_| invalid("is not a valid executable"))?;
    if meta.is_dir() {
        return Err(invalid("is a directory"));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(invalid("does not have exec permissions"));
        }
    }

    Ok(())
}

/// Resolve the executable from the process environment.
pub fn resolve_executable() -> Result<ExecutablePath> {
    Resolver::from_env().resolve()
}

/// Inputs to executable resolution.
///
/// [`Resolver::from_env`] captures the real environment; tests build one by
/// hand with the `with_*` setters.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    compiled_default: Option<PathBuf>,
    env_override: Option<PathBuf>,
    search_path: Option<OsString>,
    working_dir: Option<PathBuf>,
    materialize_dir: Option<PathBuf>,
}

impl Resolver {
    /// A resolver with no candidates at all.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self {
            compiled_default: COMPILED_DEFAULT
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            env_override: std::env::var_os(ENV_OVERRIDE).map(PathBuf::from),
            search_path: std::env::var_os("PATH"),
            working_dir: std::env::current_dir().ok(),
            materialize_dir: Some(std::env::temp_dir()),
        }
    }

    pub fn with_compiled_default(mut self, path: impl Into<PathBuf>) -> Self {
        self.compiled_default = Some(path.into());
        self
    }

    pub fn with_env_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_override = Some(path.into());
        self
    }

    pub fn with_search_path(mut self, paths: impl Into<OsString>) -> Self {
        self.search_path = Some(paths.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn without_working_dir(mut self) -> Self {
        self.working_dir = None;
        self
    }

    pub fn with_materialize_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.materialize_dir = Some(dir.into());
        self
    }

    pub fn resolve(&self) -> Result<ExecutablePath> {
        let (path, source) = self.select()?;
        verify_executable(&path)?;
        debug!(path = %path.display(), %source, "resolved vipser executable");
        Ok(ExecutablePath { path, source })
    }

    /// Pick the first present candidate without verifying it.
    fn select(&self) -> Result<(PathBuf, ResolutionSource)> {
        if let Some(path) = &self.compiled_default {
            return Ok((path.clone(), ResolutionSource::CompiledDefault));
        }
        if let Some(path) = &self.env_override {
            return Ok((path.clone(), ResolutionSource::Environment));
        }
        if let Some(path) = self.search() {
            return Ok((path, ResolutionSource::SearchPath));
        }
        match &self.working_dir {
            Some(dir) => Ok((dir.join(EXECUTABLE_NAME), ResolutionSource::WorkingDirectory)),
            None => {
                let dir = self.materialize_dir.as_deref().ok_or_else(|| {
                    VipserError::NotFound(
                        "no working directory and no directory to install the bundled binary"
                            .to_string(),
                    )
                })?;
                debug!(dir = %dir.display(), "working directory unavailable; installing bundled binary");
                Ok((materialize_bundled(dir)?, ResolutionSource::Bundled))
            }
        }
    }

    /// First `vipser` on the search path that would pass verification.
    ///
    /// Empty entries mean the current directory.
    fn search(&self) -> Option<PathBuf> {
        let paths = self.search_path.as_ref()?;
        std::env::split_paths(paths)
            .map(|dir| {
                if dir.as_os_str().is_empty() {
                    PathBuf::from(".")
                } else {
                    dir
                }
            })
            .map(|dir| dir.join(EXECUTABLE_NAME))
            .find(|candidate| verify_executable(candidate).is_ok())
    }
}
