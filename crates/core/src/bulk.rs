//! Whole-buffer transfers
//!
//! Both helpers close the stream they open on every exit path.

use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::opener::Opener;
use crate::traits::Close;

/// Initial capacity of the buffer filled by [`read_all`]
pub const READ_ALL_CAPACITY: usize = 1000;

/// A failed [`read_all`] together with the bytes gathered before the failure
#[derive(thiserror::Error, Debug)]
#[error("{source}")]
pub struct PartialRead {
    /// Bytes read before the error
    pub partial: Vec<u8>,
    /// First error encountered
    #[source]
    pub source: Error,
}

impl PartialRead {
    pub fn into_parts(self) -> (Vec<u8>, Error) {
        (self.partial, self.source)
    }
}

impl From<PartialRead> for Error {
    fn from(err: PartialRead) -> Self {
        err.source
    }
}

/// Write `data` to `descriptor` and close it
///
/// The first error among open, write and close is returned.
pub async fn write_all(opener: &Opener, descriptor: &str, data: &[u8]) -> Result<()> {
    let mut writer = opener.open_write(descriptor).await?;
    let written = writer.write_all(data).await;
    let closed = writer.close().await;
    written?;
    closed
}

/// Read `descriptor` to end of stream and close it
pub async fn read_all(
    opener: &Opener,
    descriptor: &str,
) -> std::result::Result<Vec<u8>, PartialRead> {
    let mut reader = opener
        .open_read(descriptor)
        .await
        .map_err(|source| PartialRead {
            partial: Vec::new(),
            source,
        })?;

    let mut buffer = Vec::with_capacity(READ_ALL_CAPACITY);
    let copied = tokio::io::copy(&mut reader, &mut buffer).await;
    let closed = reader.close().await;

    let outcome = match copied {
        Ok(_) => closed,
        Err(e) => Err(Error::Io(e)),
    };
    match outcome {
        Ok(()) => Ok(buffer),
        Err(source) => Err(PartialRead {
            partial: buffer,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemorySink;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn opener() -> Opener {
        Opener::new(Arc::new(MemorySink::new()))
    }

    #[tokio::test]
    async fn test_read_all_literal() {
        let data = read_all(&opener(), "text:S p a c e s").await.unwrap();
        assert_eq!(data, b"S p a c e s");

        let data = read_all(&opener(), "text:").await.unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("round.bin");
        let path = path.to_str().unwrap();
        let opener = opener();

        let data: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
        write_all(&opener, path, &data).await.unwrap();
        assert_eq!(read_all(&opener, path).await.unwrap(), data);

        write_all(&opener, path, b"").await.unwrap();
        assert!(read_all(&opener, path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_all_open_failure() {
        let err = read_all(&opener(), "/nonexistent/tarp/file")
            .await
            .unwrap_err();
        let (partial, source) = err.into_parts();
        assert!(partial.is_empty());
        assert!(matches!(source, Error::Open { .. }));
    }

    #[tokio::test]
    async fn test_write_all_open_failure() {
        let err = write_all(&opener(), "text:readonly", b"x").await.unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_all_pipe() {
        let data = read_all(&opener(), "pipe:printf hello").await.unwrap();
        assert_eq!(data, b"hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_all_keeps_output_of_failed_command() {
        let err = read_all(&opener(), "pipe:printf partial; exit 3")
            .await
            .unwrap_err();
        assert_eq!(err.partial, b"partial");
        assert_eq!(err.source.exit_status_code(), Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_all_pipe_exit_status() {
        let err = write_all(&opener(), "pipe:cat > /dev/null; exit 3", b"bytes")
            .await
            .unwrap_err();
        assert_eq!(err.exit_status_code(), Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_all_pipe_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gz.out");
        let opener = opener();
        write_all(
            &opener,
            &format!("pipe:cat > '{}'", path.display()),
            b"through a pipe",
        )
        .await
        .unwrap();
        let back = read_all(&opener, path.to_str().unwrap()).await.unwrap();
        assert_eq!(back, b"through a pipe");
    }
}
