//! Writable resources

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::descriptor::Scheme;
use crate::error::{Error, Result};
use crate::process::CommandWriter;
use crate::traits::Close;

/// Output stream produced by [`crate::Opener::open_write`]
#[derive(Debug)]
pub enum Writer {
    /// The process's standard output; closing flushes but leaves fd 1 open
    Stdout(tokio::io::Stdout),
    /// Stdin of a child process
    Command(CommandWriter),
    /// A created/truncated file
    File { file: tokio::fs::File, path: PathBuf },
    /// Already closed; writes fail
    Closed,
}

impl Writer {
    /// Scheme the stream was opened with, or `None` once closed
    pub fn scheme(&self) -> Option<Scheme> {
        match self {
            Writer::Stdout(_) => Some(Scheme::Stdio),
            Writer::Command(_) => Some(Scheme::Subprocess),
            Writer::File { .. } => Some(Scheme::File),
            Writer::Closed => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Writer::Closed)
    }
}

impl AsyncWrite for Writer {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Writer::Stdout(stdout) => Pin::new(stdout).poll_write(cx, buf),
            Writer::Command(command) => Pin::new(command).poll_write(cx, buf),
            Writer::File { file, .. } => Pin::new(file).poll_write(cx, buf),
            Writer::Closed => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write to a closed stream",
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Writer::Stdout(stdout) => Pin::new(stdout).poll_flush(cx),
            Writer::Command(command) => Pin::new(command).poll_flush(cx),
            Writer::File { file, .. } => Pin::new(file).poll_flush(cx),
            Writer::Closed => Poll::Ready(Ok(())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Writer::Stdout(stdout) => Pin::new(stdout).poll_shutdown(cx),
            Writer::Command(command) => Pin::new(command).poll_shutdown(cx),
            Writer::File { file, .. } => Pin::new(file).poll_shutdown(cx),
            Writer::Closed => Poll::Ready(Ok(())),
        }
    }
}

#[async_trait]
impl Close for Writer {
    async fn close(&mut self) -> Result<()> {
        match std::mem::replace(self, Writer::Closed) {
            Writer::Closed => Err(Error::Closed),
            Writer::Stdout(mut stdout) => stdout.flush().await.map_err(|source| Error::Close {
                descriptor: "-".to_string(),
                source,
            }),
            // tokio completes file writes in the background; flush surfaces
            // their errors before the descriptor is released.
            Writer::File { mut file, path } => {
                file.flush().await.map_err(|source| Error::Close {
                    descriptor: path.display().to_string(),
                    source,
                })
            }
            Writer::Command(mut command) => command.close().await,
        }
    }
}
