//! Subprocess streams
//!
//! A [`CommandReader`] owns a child and its captured stdout; a
//! [`CommandWriter`] owns a child and its stdin. Each is closed exactly once:
//! the pipe end is released first, then the child is reaped and its exit
//! status is checked.

use std::io;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::diag::SharedSink;
use crate::error::{Error, Result};
use crate::traits::Close;

/// Default command interpreter
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Flag that makes the interpreter run its next argument as a script
pub const DEFAULT_SHELL_FLAG: &str = "-c";

/// Command interpreter used for `pipe:` descriptors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shell {
    /// Interpreter executable
    pub program: String,
    /// Flag preceding the script argument
    pub flag: String,
}

impl Default for Shell {
    fn default() -> Self {
        Self {
            program: DEFAULT_SHELL.to_string(),
            flag: DEFAULT_SHELL_FLAG.to_string(),
        }
    }
}

/// What to run in a child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// A script handed verbatim to the shell
    Shell(String),
    /// A program with an explicit argument list, no shell involved
    Exec { program: String, args: Vec<String> },
}

impl CommandSpec {
    /// Build an argv-style spec
    pub fn exec<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::Exec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn command(&self, shell: &Shell) -> Command {
        match self {
            CommandSpec::Shell(script) => {
                let mut command = Command::new(&shell.program);
                command.arg(&shell.flag).arg(script);
                command
            }
            CommandSpec::Exec { program, args } => {
                let mut command = Command::new(program);
                command.args(args);
                command
            }
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandSpec::Shell(script) => f.write_str(script),
            CommandSpec::Exec { program, args } => {
                f.write_str(program)?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
        }
    }
}

/// Lifecycle of a read-side subprocess stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Running,
    OutputDrained,
    Reaped,
}

/// Lifecycle of a write-side subprocess stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Running,
    InputClosed,
    Reaped,
}

fn closed_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "stream is closed")
}

fn missing_pipe(label: &str, which: &str) -> Error {
    Error::Open {
        descriptor: label.to_string(),
        source: io::Error::other(format!("{which} pipe was not captured")),
    }
}

/// Child process whose stdout is read as a stream
pub struct CommandReader {
    label: String,
    child: Child,
    stdout: Option<ChildStdout>,
    state: ReadState,
    sink: SharedSink,
}

impl CommandReader {
    /// Spawn `spec` with its stdout captured
    ///
    /// The child's stdin is the null device and its stderr is inherited.
    pub fn spawn(spec: &CommandSpec, shell: &Shell, sink: SharedSink) -> Result<Self> {
        let label = spec.to_string();
        let mut command = spec.command(shell);
        // The stdout pipe must be requested on the builder before spawn().
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        sink.record(&format!("spawn reader: {label}"));
        let mut child = command.spawn().map_err(|source| Error::Open {
            descriptor: label.clone(),
            source,
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| missing_pipe(&label, "stdout"))?;

        Ok(Self {
            label,
            child,
            stdout: Some(stdout),
            state: ReadState::Running,
            sink,
        })
    }

    /// OS process id, while the child has not been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn state(&self) -> ReadState {
        self.state
    }
}

impl std::fmt::Debug for CommandReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandReader")
            .field("command", &self.label)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for CommandReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut().stdout.as_mut() {
            Some(stdout) => Pin::new(stdout).poll_read(cx, buf),
            None => Poll::Ready(Err(closed_pipe())),
        }
    }
}

#[async_trait]
impl Close for CommandReader {
    async fn close(&mut self) -> Result<()> {
        if self.state != ReadState::Running {
            return Err(Error::Closed);
        }

        drop(self.stdout.take());
        self.state = ReadState::OutputDrained;

        let status = self.child.wait().await?;
        self.state = ReadState::Reaped;
        self.sink
            .record(&format!("reaped reader: {} ({status})", self.label));

        if status.success() {
            Ok(())
        } else {
            Err(Error::from_status(&self.label, status))
        }
    }
}

/// Child process fed through its stdin
///
/// The child's stdout and stderr are the current process's own.
pub struct CommandWriter {
    label: String,
    child: Child,
    stdin: Option<ChildStdin>,
    state: WriteState,
    written: u64,
    sink: SharedSink,
}

impl CommandWriter {
    /// Spawn `spec` with its stdin piped
    pub fn spawn(spec: &CommandSpec, shell: &Shell, sink: SharedSink) -> Result<Self> {
        let label = spec.to_string();
        let mut command = spec.command(shell);
        // The stdin pipe must be requested on the builder before spawn().
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        sink.record(&format!("spawn writer: {label}"));
        let mut child = command.spawn().map_err(|source| {
            sink.record(&format!("failed to start: {label}"));
            Error::Open {
                descriptor: label.clone(),
                source,
            }
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| missing_pipe(&label, "stdin"))?;

        Ok(Self {
            label,
            child,
            stdin: Some(stdin),
            written: 0,
            state: WriteState::Running,
            sink,
        })
    }

    /// OS process id, while the child has not been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn state(&self) -> WriteState {
        self.state
    }
}

impl std::fmt::Debug for CommandWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandWriter")
            .field("command", &self.label)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AsyncWrite for CommandWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let Some(stdin) = this.stdin.as_mut() else {
            return Poll::Ready(Err(closed_pipe()));
        };
        let poll = Pin::new(stdin).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = &poll {
            this.written += *n as u64;
        }
        poll
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut().stdin.as_mut() {
            Some(stdin) => Pin::new(stdin).poll_flush(cx),
            None => Poll::Ready(Ok(())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut().stdin.as_mut() {
            Some(stdin) => Pin::new(stdin).poll_shutdown(cx),
            None => Poll::Ready(Ok(())),
        }
    }
}

#[async_trait]
impl Close for CommandWriter {
    async fn close(&mut self) -> Result<()> {
        if self.state != WriteState::Running {
            return Err(Error::Closed);
        }
        let Some(mut stdin) = self.stdin.take() else {
            return Err(Error::Closed);
        };

        // EOF reaches the child only once its stdin is dropped; waiting
        // before this point would block forever on readers like `cat`.
        self.sink.record(&format!(
            "closing input: {} ({} bytes written)",
            self.label, self.written
        ));
        let flushed = stdin.flush().await;
        drop(stdin);
        self.state = WriteState::InputClosed;
        flushed.map_err(|source| Error::Close {
            descriptor: self.label.clone(),
            source,
        })?;

        let status = self.child.wait().await?;
        self.state = WriteState::Reaped;
        self.sink
            .record(&format!("reaped writer: {} ({status})", self.label));

        if status.success() {
            Ok(())
        } else {
            Err(Error::from_status(&self.label, status))
        }
    }
}

/// Run `spec` to completion with inherited stdout/stderr and null stdin
pub async fn run(spec: &CommandSpec, shell: &Shell, sink: &SharedSink) -> Result<()> {
    let label = spec.to_string();
    sink.record(&format!("run: {label}"));
    let mut command = spec.command(shell);
    command.stdin(Stdio::null());
    let status = command
        .status()
        .await
        .map_err(|source| Error::Open {
            descriptor: label.clone(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::from_status(label, status))
    }
}
