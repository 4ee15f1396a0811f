// src/exec/mod.rs

//! Process execution layer.
//!
//! [`runner`] spawns the external executable with `tokio::process::Command`,
//! streams the caller's input and output through its standard streams,
//! captures standard error and turns exit codes and cancellation into
//! [`VipserError`](crate::errors::VipserError)s.

pub mod runner;

pub use runner::{command_line, run_process};
