// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::command::Command;
use crate::config::DEFAULT_CONFIG_PATH;

/// Command-line arguments for `vipser`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "vipser",
    version,
    about = "Run image pipelines through the vipser executable.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Vipser.toml` in the working directory is used when present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `VIPSER_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run a pipeline over an image.
    ///
    /// Steps use the executable's own grammar, e.g.
    /// `vipser run AUTOROT RESIZE,512,384 EXPORT,png < in.jpg > out.png`.
    Run(RunArgs),

    /// Print the executable that would be used and where it was found.
    Resolve {
        /// Use this executable instead of resolving one.
        #[arg(long, value_name = "PATH")]
        executable: Option<PathBuf>,
    },

    /// Write a binary as Rust source declaring a byte array.
    ///
    /// Reads the binary from stdin and writes the source to stdout.
    Embed {
        /// Name of the generated module.
        #[arg(long, env = "MODULE", value_name = "NAME")]
        module: String,

        /// Name of the generated byte-array static.
        #[arg(long, env = "VAR", value_name = "NAME")]
        name: String,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Use this executable instead of resolving one.
    #[arg(long, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Kill the process if it runs longer than this many milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Read the image from this file instead of stdin.
    #[arg(long, short, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Write the result to this file instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pipeline steps in order, e.g. `RESIZE,512,384`.
    #[arg(value_name = "STEP")]
    pub steps: Vec<Command>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    /// Config path to load and whether the user named it explicitly.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
