// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [executable]
/// path = "/opt/vipser/bin/vipser"
///
/// [run]
/// timeout_ms = 30000
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub executable: ExecutableSection,

    #[serde(default)]
    pub run: RunSection,
}

/// `[executable]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutableSection {
    /// Explicit executable. When set, environment-based resolution is skipped
    /// and this path is verified directly.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[run]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunSection {
    /// Deadline for one run in milliseconds. `0` or absent means none.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl RunSection {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}
