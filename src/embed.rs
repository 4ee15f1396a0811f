// src/embed.rs

//! Turn a binary into Rust source declaring it as a byte array.
//!
//! This is the generator behind `vipser embed`; its output is what the
//! `bundled` feature compiles in (see [`crate::resolve::materialize`]).
//! It has no connection to the runtime path.

use std::io::{ErrorKind, Read, Write};

use tracing::debug;

use crate::errors::{Result, VipserError};

/// Bytes per output line after the first.
pub const BYTES_PER_LINE: usize = 10;

const CHUNK_SIZE: usize = 4096;

/// Names for the generated `pub mod <module> { pub static <variable> ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub module: String,
    pub variable: String,
}

impl SourceFile {
    pub fn new(module: impl Into<String>, variable: impl Into<String>) -> Result<Self> {
        let module = module.into().trim().to_string();
        let variable = variable.into().trim().to_string();
        ensure_identifier("module", &module)?;
        ensure_identifier("variable", &variable)?;
        Ok(Self { module, variable })
    }

    /// Stream `input` into `output` as Rust source. Returns the byte count.
    ///
    /// A line break follows every byte whose offset from the start of the
    /// stream is a multiple of [`BYTES_PER_LINE`]; offsets are counted across
    /// read chunks, not per line.
    pub fn write(&self, mut input: impl Read, mut output: impl Write) -> Result<usize> {
        writeln!(output, "pub mod {} {{", self.module)?;
        write!(output, "pub static {}: &[u8] = &[", self.variable)?;

        let mut buf = [0u8; CHUNK_SIZE];
        let mut total = 0usize;

        loop {
            let n = match input.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            for (i, byte) in buf[..n].iter().enumerate() {
                write!(output, "0x{byte:02X},")?;
                if (total + i) % BYTES_PER_LINE == 0 {
                    output.write_all(b"\n  ")?;
                } else {
                    output.write_all(b" ")?;
                }
            }
            total += n;
        }

        output.write_all(b"\n];\n}\n")?;
        output.flush()?;

        debug!(module = %self.module, variable = %self.variable, bytes = total, "embedded binary");
        Ok(total)
    }
}

fn ensure_identifier(what: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic());
    if !valid_start || !chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
        return Err(VipserError::Config(format!(
            "embed {what} name {name:?} is not a valid identifier"
        )));
    }
    Ok(())
}
