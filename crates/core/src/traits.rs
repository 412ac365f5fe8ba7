//! Close trait definition
//!
//! Every stream handed out by the opener owns an OS resource (a file
//! descriptor, a pipe end, a child process) that is released by `close()`.

use async_trait::async_trait;

use crate::error::Result;

/// A stream that must be explicitly closed exactly once
///
/// For subprocess streams, `close()` releases the pipe end and then awaits
/// the child; a non-success exit status becomes [`crate::Error::Process`].
/// Closing twice returns [`crate::Error::Closed`].
#[async_trait]
pub trait Close: Send {
    /// Release the underlying resource
    async fn close(&mut self) -> Result<()>;
}
