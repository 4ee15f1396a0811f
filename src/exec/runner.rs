// src/exec/runner.rs

//! Single process invocation.

use std::future::Future;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::errors::{Result, VipserError};

/// Human-readable command line used in errors and logs.
pub fn command_line(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Run `program` with `args`, piping `input` to its stdin and its stdout to
/// `output`.
///
/// Each argument is passed as its own argv entry; no shell is involved.
/// Standard error is captured and only surfaces inside
/// [`VipserError::Execution`].
///
/// - If `cancel` completes before the process exits, the process is killed
///   and reaped and [`VipserError::Cancelled`] is returned.
/// - A non-zero exit (or death by signal, reported as `-1`) becomes
///   [`VipserError::Execution`].
pub async fn run_process<I, O, C>(
    program: &Path,
    args: &[String],
    input: &mut I,
    output: &mut O,
    cancel: C,
) -> Result<()>
where
    I: AsyncRead + Unpin + ?Sized,
    O: AsyncWrite + Unpin + ?Sized,
    C: Future<Output = ()>,
{
    let command = command_line(program, args);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| VipserError::Start {
        program: program.to_path_buf(),
        source,
    })?;

    info!(
        program = %program.display(),
        steps = args.len(),
        pid = child.id(),
        "started vipser process"
    );

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Either all streams drain and the process exits, or cancellation wins
    // and the in-flight copies are dropped.
    let finished = tokio::select! {
        res = drive(&mut child, stdin, stdout, stderr, input, output) => Some(res),
        _ = cancel => None,
    };

    let Some(res) = finished else {
        warn!(command = %command, "cancellation requested; killing vipser process");
        if let Err(e) = child.kill().await {
            warn!(command = %command, error = %e, "failed to kill vipser process");
        }
        return Err(VipserError::Cancelled { command });
    };

    let (status, stderr) = res?;
    if status.success() {
        debug!(command = %command, "vipser process exited successfully");
        return Ok(());
    }

    let code = status.code().unwrap_or(-1);
    warn!(command = %command, exit_code = code, "vipser process failed");

    Err(VipserError::Execution {
        command,
        code,
        stderr,
    })
}

/// Copy the three standard streams concurrently, then wait for exit.
async fn drive<I, O>(
    child: &mut Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    input: &mut I,
    output: &mut O,
) -> Result<(ExitStatus, Vec<u8>)>
where
    I: AsyncRead + Unpin + ?Sized,
    O: AsyncWrite + Unpin + ?Sized,
{
    let feed = async {
        let Some(mut stdin) = stdin else {
            return Ok(());
        };
        match tokio::io::copy(&mut *input, &mut stdin).await {
            Ok(bytes) => debug!(bytes, "input written to stdin"),
            // The process may legitimately exit without reading its input.
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("process closed stdin before all input was written");
            }
            Err(e) => return Err(e),
        }
        // Dropping `stdin` here closes the pipe so the process sees EOF.
        Ok::<_, std::io::Error>(())
    };

    let drain = async {
        let Some(mut stdout) = stdout else {
            return Ok(());
        };
        let bytes = tokio::io::copy(&mut stdout, &mut *output).await?;
        output.flush().await?;
        debug!(bytes, "stdout copied to output");
        Ok::<_, std::io::Error>(())
    };

    let capture = async {
        let mut buf = Vec::new();
        if let Some(mut stderr) = stderr {
            stderr.read_to_end(&mut buf).await?;
        }
        Ok::<_, std::io::Error>(buf)
    };

    let (fed, drained, captured) = tokio::join!(feed, drain, capture);
    let status = child.wait().await?;

    fed?;
    drained?;
    Ok((status, captured?))
}
