// src/operation.rs

//! Fluent pipeline builder.
//!
//! An [`Operation`] collects [`Command`]s in call order, holds the resolved
//! executable and the input/output streams, and is consumed by a single run.
//! Streams may borrow from the caller, so a `&mut Vec<u8>` sink can be read
//! once the run returns.
//!
//! ```no_run
//! # async fn demo(image: Vec<u8>) -> vipser::errors::Result<()> {
//! use vipser::Operation;
//!
//! let mut op = Operation::new()?;
//! op.autorot().resize(512, 384).format("png");
//! let png = op.apply(&image).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::command::{Command, EmbedColor, Param, Verb};
use crate::errors::{Result, VipserError};
use crate::exec::run_process;
use crate::resolve::{ExecutablePath, resolve_executable};

type Input<'a> = Box<dyn AsyncRead + Send + Unpin + 'a>;
type Output<'a> = Box<dyn AsyncWrite + Send + Unpin + 'a>;

pub struct Operation<'a> {
    commands: Vec<Command>,
    executable: ExecutablePath,
    input: Option<Input<'a>>,
    output: Option<Output<'a>>,
}

impl<'a> Operation<'a> {
    /// Resolve the executable from the environment and start an empty pipeline.
    pub fn new() -> Result<Self> {
        Ok(Self::with_executable(resolve_executable()?))
    }

    pub fn with_executable(executable: ExecutablePath) -> Self {
        Self {
            commands: Vec::new(),
            executable,
            input: None,
            output: None,
        }
    }

    pub fn executable(&self) -> &ExecutablePath {
        &self.executable
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Append an already-built step.
    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    fn step<const N: usize>(&mut self, verb: Verb, params: [Param; N]) -> &mut Self {
        self.push(Command::new(verb, params.into()))
    }

    pub fn resize(&mut self, width: i32, height: i32) -> &mut Self {
        self.step(Verb::Resize, [width.into(), height.into()])
    }

    pub fn stretch(&mut self, width: i32, height: i32) -> &mut Self {
        self.step(Verb::Stretch, [width.into(), height.into()])
    }

    pub fn expand(&mut self, width: i32, height: i32) -> &mut Self {
        self.step(Verb::Expand, [width.into(), height.into()])
    }

    pub fn extract(&mut self, left: i32, top: i32, width: i32, height: i32) -> &mut Self {
        self.step(
            Verb::Extract,
            [left.into(), top.into(), width.into(), height.into()],
        )
    }

    pub fn embed(&mut self, x: i32, y: i32, width: i32, height: i32, color: EmbedColor) -> &mut Self {
        self.step(
            color.verb(),
            [x.into(), y.into(), width.into(), height.into()],
        )
    }

    pub fn embed_white(&mut self, x: i32, y: i32, width: i32, height: i32) -> &mut Self {
        self.embed(x, y, width, height, EmbedColor::White)
    }

    pub fn embed_black(&mut self, x: i32, y: i32, width: i32, height: i32) -> &mut Self {
        self.embed(x, y, width, height, EmbedColor::Black)
    }

    pub fn blur(&mut self, sigma: f64) -> &mut Self {
        self.step(Verb::Blur, [sigma.into()])
    }

    pub fn rotate(&mut self, angle: i32) -> &mut Self {
        self.step(Verb::Rotate, [angle.into()])
    }

    pub fn autorot(&mut self) -> &mut Self {
        self.step(Verb::Autorot, [])
    }

    pub fn quality(&mut self, quality: i32) -> &mut Self {
        self.step(Verb::Quality, [quality.into()])
    }

    /// Output format, rendered as an `EXPORT` step.
    pub fn format(&mut self, format: &str) -> &mut Self {
        self.step(Verb::Export, [format.into()])
    }

    /// One process argument per step, in insertion order.
    pub fn render_arguments(&self) -> Vec<String> {
        self.commands.iter().map(Command::render).collect()
    }

    pub fn set_input(&mut self, input: impl AsyncRead + Send + Unpin + 'a) -> &mut Self {
        self.input = Some(Box::new(input));
        self
    }

    pub fn set_output(&mut self, output: impl AsyncWrite + Send + Unpin + 'a) -> &mut Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn with_input(mut self, input: impl AsyncRead + Send + Unpin + 'a) -> Self {
        self.set_input(input);
        self
    }

    pub fn with_output(mut self, output: impl AsyncWrite + Send + Unpin + 'a) -> Self {
        self.set_output(output);
        self
    }

    /// Run to completion with no way to cancel.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run, killing the process if it has not finished within `timeout`.
    pub async fn run_with_timeout(self, timeout: Duration) -> Result<()> {
        self.run_until(tokio::time::sleep(timeout))
            .await
            .map_err(|e| timed_out(e, timeout))
    }

    /// Run until the process exits or `cancel` completes, whichever is first.
    ///
    /// Both streams must be attached; the checks happen before anything is
    /// spawned.
    pub async fn run_until(self, cancel: impl Future<Output = ()>) -> Result<()> {
        let Operation {
            commands,
            executable,
            input,
            output,
        } = self;

        let mut input = input.ok_or(VipserError::MissingInput)?;
        let mut output = output.ok_or(VipserError::MissingOutput)?;

        let args: Vec<String> = commands.iter().map(Command::render).collect();
        debug!(executable = %executable, ?args, "running operation");

        run_process(executable.path(), &args, &mut input, &mut output, cancel).await
    }

    /// Run over an in-memory buffer and return the produced bytes.
    ///
    /// Any streams attached earlier are ignored.
    pub async fn apply(self, input: &[u8]) -> Result<Vec<u8>> {
        self.apply_until(input, std::future::pending()).await
    }

    pub async fn apply_with_timeout(self, input: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        self.apply_until(input, tokio::time::sleep(timeout))
            .await
            .map_err(|e| timed_out(e, timeout))
    }

    pub async fn apply_until(
        self,
        input: &[u8],
        cancel: impl Future<Output = ()>,
    ) -> Result<Vec<u8>> {
        let args = self.render_arguments();
        let mut reader = input;
        let mut out = Vec::new();

        run_process(self.executable.path(), &args, &mut reader, &mut out, cancel).await?;
        Ok(out)
    }
}

fn timed_out(err: VipserError, timeout: Duration) -> VipserError {
    match err {
        VipserError::Cancelled { command } => VipserError::TimedOut { command, timeout },
        other => other,
    }
}

impl fmt::Debug for Operation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("commands", &self.render_arguments())
            .field("executable", &self.executable)
            .field("input", &self.input.is_some())
            .field("output", &self.output.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op() -> Operation<'static> {
        Operation::with_executable(ExecutablePath::program("vipser"))
    }

    #[test]
    fn no_steps_renders_empty() {
        assert_eq!(op().render_arguments(), Vec::<String>::new());
    }

    #[test]
    fn steps_render_in_call_order() {
        let mut o = op();
        o.resize(1, 2).stretch(3, 4);
        assert_eq!(o.render_arguments(), vec!["RESIZE,1,2", "STRETCH,3,4"]);
    }

    #[test]
    fn every_builder_renders_its_verb() {
        let cases: Vec<(&str, fn(&mut Operation<'_>))> = vec![
            ("RESIZE,1,2", |o: &mut Operation<'_>| {
                o.resize(1, 2);
            }),
            ("STRETCH,1,2", |o: &mut Operation<'_>| {
                o.stretch(1, 2);
            }),
            ("EXPAND,1,2", |o: &mut Operation<'_>| {
                o.expand(1, 2);
            }),
            ("EXTRACT,1,2,3,4", |o: &mut Operation<'_>| {
                o.extract(1, 2, 3, 4);
            }),
            ("EMBWHT,1,2,3,4", |o: &mut Operation<'_>| {
                o.embed_white(1, 2, 3, 4);
            }),
            ("EMBBLK,1,2,3,4", |o: &mut Operation<'_>| {
                o.embed_black(1, 2, 3, 4);
            }),
            ("EMBBLK,5,6,7,8", |o: &mut Operation<'_>| {
                o.embed(5, 6, 7, 8, EmbedColor::Black);
            }),
            ("BLUR,0.5", |o: &mut Operation<'_>| {
                o.blur(0.5);
            }),
            ("BLUR,3", |o: &mut Operation<'_>| {
                o.blur(3.0);
            }),
            ("ROTATE,90", |o: &mut Operation<'_>| {
                o.rotate(90);
            }),
            ("AUTOROT", |o: &mut Operation<'_>| {
                o.autorot();
            }),
            ("QUALITY,85", |o: &mut Operation<'_>| {
                o.quality(85);
            }),
            ("EXPORT,png", |o: &mut Operation<'_>| {
                o.format("png");
            }),
        ];

        for (expected, build) in cases {
            let mut o = op();
            build(&mut o);
            assert_eq!(o.render_arguments(), vec![expected.to_string()], "{expected}");
        }
    }

    #[test]
    fn no_range_validation_at_build_time() {
        let mut o = op();
        o.resize(-1, 0).quality(1000).rotate(-45);
        assert_eq!(o.render_arguments(), vec!["RESIZE,-1,0", "QUALITY,1000", "ROTATE,-45"]);
    }

    #[tokio::test]
    async fn missing_input_is_reported_before_spawning() {
        // The executable does not exist; reaching spawn would be a Start error.
        let o = Operation::with_executable(ExecutablePath::program("/no/such/vipser"))
            .with_output(Vec::new());
        assert!(matches!(o.run().await, Err(VipserError::MissingInput)));
    }

    #[tokio::test]
    async fn missing_output_is_reported_before_spawning() {
        let o = Operation::with_executable(ExecutablePath::program("/no/such/vipser"))
            .with_input(&b"data"[..]);
        assert!(matches!(o.run().await, Err(VipserError::MissingOutput)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn borrowed_sink_is_readable_after_run() {
        let payload = vec![0x5Au8; 256 * 1024];
        let mut sink = Vec::new();

        Operation::with_executable(ExecutablePath::program("cat"))
            .with_input(&payload[..])
            .with_output(&mut sink)
            .run()
            .await
            .unwrap();

        assert_eq!(sink, payload);
    }

    #[test]
    fn operation_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Operation<'static>>();
    }
}
