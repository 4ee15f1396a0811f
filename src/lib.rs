// src/lib.rs

//! Build image pipelines for the external `vipser` executable and run them
//! as a subprocess.
//!
//! - [`command`]: one step (`RESIZE,512,384`) and its argument grammar.
//! - [`operation`]: the fluent pipeline builder and its run methods.
//! - [`exec`]: the process runner (streams, cancellation, exit codes).
//! - [`resolve`]: finding and verifying the executable.
//! - [`embed`]: the byte-array source generator behind the `bundled` feature.

pub mod cli;
pub mod command;
pub mod config;
pub mod embed;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod operation;
pub mod resolve;

pub use command::{Command, EmbedColor, Param, Verb};
pub use errors::{Result, VipserError};
pub use operation::Operation;
pub use resolve::{ExecutablePath, ResolutionSource, Resolver, resolve_executable};

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::cli::{CliArgs, CliCommand, RunArgs};
use crate::config::{ConfigFile, RunSection, load_and_validate, load_or_default};
use crate::embed::SourceFile;

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let (config_path, explicit) = args.config_path();
    let cfg = if explicit {
        load_and_validate(&config_path)
    } else {
        load_or_default(&config_path)
    }
    .with_context(|| format!("loading config from {}", config_path.display()))?;

    match args.command {
        CliCommand::Run(run_args) => run_pipeline(run_args, &cfg).await,
        CliCommand::Resolve { executable } => {
            let exe = pick_executable(executable.as_deref(), &cfg)?;
            println!("{}\t({})", exe, exe.source());
            Ok(())
        }
        CliCommand::Embed { module, name } => {
            let source = SourceFile::new(module, name)?;
            let bytes = tokio::task::spawn_blocking(move || {
                source.write(std::io::stdin().lock(), std::io::stdout().lock())
            })
            .await??;
            debug!(bytes, "embed finished");
            Ok(())
        }
    }
}

/// CLI flag first, then `[executable].path`, then environment resolution.
fn pick_executable(flag: Option<&Path>, cfg: &ConfigFile) -> anyhow::Result<ExecutablePath> {
    let explicit: Option<PathBuf> = flag
        .map(Path::to_path_buf)
        .or_else(|| cfg.executable.path.clone());

    let exe = match explicit {
        Some(path) => ExecutablePath::explicit(path)?,
        None => resolve_executable()?,
    };
    Ok(exe)
}

async fn run_pipeline(args: RunArgs, cfg: &ConfigFile) -> anyhow::Result<()> {
    let executable = pick_executable(args.executable.as_deref(), cfg)?;

    let mut op = Operation::with_executable(executable);
    for step in args.steps {
        op.push(step);
    }

    match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening input {}", path.display()))?;
            op.set_input(file);
        }
        None => {
            op.set_input(tokio::io::stdin());
        }
    }

    match &args.output {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("creating output {}", path.display()))?;
            op.set_output(file);
        }
        None => {
            op.set_output(tokio::io::stdout());
        }
    }

    let timeout = RunSection {
        timeout_ms: args.timeout_ms.or(cfg.run.timeout_ms),
    }
    .timeout();

    info!(steps = ?op.render_arguments(), ?timeout, "running pipeline");

    match timeout {
        Some(t) => op.run_with_timeout(t).await?,
        None => op.run().await?,
    }
    Ok(())
}
