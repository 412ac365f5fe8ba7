//! Readable resources

use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, ReadBuf};

use crate::descriptor::Scheme;
use crate::error::{Error, Result};
use crate::process::CommandReader;
use crate::traits::Close;

/// Input stream produced by [`crate::Opener::open_read`]
#[derive(Debug)]
pub enum Reader {
    /// The process's standard input; closing leaves fd 0 open
    Stdin(tokio::io::Stdin),
    /// Literal bytes
    Text(Cursor<Vec<u8>>),
    /// Captured stdout of a child process
    Command(CommandReader),
    /// A file opened read-only
    File(tokio::fs::File),
    /// Already closed; reads fail
    Closed,
}

impl Reader {
    /// Scheme the stream was opened with, or `None` once closed
    pub fn scheme(&self) -> Option<Scheme> {
        match self {
            Reader::Stdin(_) => Some(Scheme::Stdio),
            Reader::Text(_) => Some(Scheme::Literal),
            Reader::Command(_) => Some(Scheme::Subprocess),
            Reader::File(_) => Some(Scheme::File),
            Reader::Closed => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Reader::Closed)
    }
}

impl AsyncRead for Reader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Reader::Stdin(stdin) => Pin::new(stdin).poll_read(cx, buf),
            Reader::Text(text) => Pin::new(text).poll_read(cx, buf),
            Reader::Command(command) => Pin::new(command).poll_read(cx, buf),
            Reader::File(file) => Pin::new(file).poll_read(cx, buf),
            Reader::Closed => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stream is closed",
            ))),
        }
    }
}

#[async_trait]
impl Close for Reader {
    async fn close(&mut self) -> Result<()> {
        match std::mem::replace(self, Reader::Closed) {
            Reader::Closed => Err(Error::Closed),
            // Shared process-wide handle: only this wrapper goes away.
            Reader::Stdin(_) => Ok(()),
            Reader::Text(_) => Ok(()),
            Reader::File(file) => {
                drop(file);
                Ok(())
            }
            Reader::Command(mut command) => command.close().await,
        }
    }
}
