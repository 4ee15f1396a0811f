// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VipserError {
    /// A resolution candidate exists as a setting but is not a usable binary.
    #[error("{} {reason}", path.display())]
    Resolution { path: PathBuf, reason: String },

    /// No resolution candidate could be produced at all.
    #[error("vipser executable not found: {0}")]
    NotFound(String),

    #[error("must provide input")]
    MissingInput,

    #[error("must provide output")]
    MissingOutput,

    #[error("failed to start {}: {source}", program.display())]
    Start {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `stderr` holds the captured bytes unchanged; only the message is lossy.
    #[error("{command} exited {code}\n=======\n{}", String::from_utf8_lossy(.stderr))]
    Execution {
        command: String,
        code: i32,
        stderr: Vec<u8>,
    },

    #[error("{command} was cancelled")]
    Cancelled { command: String },

    #[error("{command} timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    #[error("invalid step: {0}")]
    InvalidStep(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl VipserError {
    /// Exit code of the external process, if this error came from one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            VipserError::Execution { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Captured standard error of the external process, if any.
    pub fn stderr(&self) -> Option<&[u8]> {
        match self {
            VipserError::Execution { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            VipserError::Cancelled { .. } | VipserError::TimedOut { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, VipserError>;
