//! Resource opener
//!
//! Turns descriptor strings into [`Reader`]s and [`Writer`]s. The opener
//! carries the shell used for `pipe:` descriptors and the diagnostic sink
//! handed to every stream it creates.

use std::io::{self, Cursor};
use std::sync::Arc;

use crate::descriptor::{resolve, Scheme};
use crate::diag::{SharedSink, TracingSink};
use crate::error::{Error, Result};
use crate::process::{self, CommandReader, CommandSpec, CommandWriter, Shell};
use crate::reader::Reader;
use crate::writer::Writer;

/// Factory for readable and writable resources
#[derive(Clone)]
pub struct Opener {
    shell: Shell,
    sink: SharedSink,
}

impl Opener {
    /// Create an opener that records diagnostics into `sink`
    pub fn new(sink: SharedSink) -> Self {
        Self {
            shell: Shell::default(),
            sink,
        }
    }

    /// Use a different interpreter for `pipe:` descriptors
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Open `descriptor` for reading
    pub async fn open_read(&self, descriptor: &str) -> Result<Reader> {
        let resolved = resolve(descriptor);
        match resolved.scheme {
            Scheme::Stdio => {
                self.sink.record("open stdin");
                Ok(Reader::Stdin(tokio::io::stdin()))
            }
            Scheme::Literal => {
                self.sink.record(&format!("text {}", resolved.payload));
                Ok(Reader::Text(Cursor::new(resolved.payload.as_bytes().to_vec())))
            }
            Scheme::Subprocess => {
                let spec = CommandSpec::Shell(resolved.payload.to_string());
                Ok(Reader::Command(self.spawn_reader(&spec)?))
            }
            Scheme::File => {
                self.sink.record(&format!("open {}", resolved.payload));
                let file = tokio::fs::File::open(resolved.path())
                    .await
                    .map_err(|source| Error::Open {
                        descriptor: descriptor.to_string(),
                        source,
                    })?;
                Ok(Reader::File(file))
            }
        }
    }

    /// Open `descriptor` for writing
    ///
    /// Files are created or truncated. Literal descriptors are read-only.
    pub async fn open_write(&self, descriptor: &str) -> Result<Writer> {
        let resolved = resolve(descriptor);
        match resolved.scheme {
            Scheme::Stdio => {
                self.sink.record("open stdout");
                Ok(Writer::Stdout(tokio::io::stdout()))
            }
            Scheme::Literal => Err(Error::Open {
                descriptor: descriptor.to_string(),
                source: io::Error::new(
                    io::ErrorKind::Unsupported,
                    "text: resources are read-only",
                ),
            }),
            Scheme::Subprocess => {
                let spec = CommandSpec::Shell(resolved.payload.to_string());
                Ok(Writer::Command(self.spawn_writer(&spec)?))
            }
            Scheme::File => {
                self.sink.record(&format!("create {}", resolved.payload));
                let path = resolved.path().to_path_buf();
                let file = tokio::fs::File::create(&path)
                    .await
                    .map_err(|source| Error::Open {
                        descriptor: descriptor.to_string(),
                        source,
                    })?;
                Ok(Writer::File { file, path })
            }
        }
    }

    /// Spawn a command whose stdout is read
    pub fn spawn_reader(&self, spec: &CommandSpec) -> Result<CommandReader> {
        CommandReader::spawn(spec, &self.shell, Arc::clone(&self.sink))
    }

    /// Spawn a command fed through its stdin
    pub fn spawn_writer(&self, spec: &CommandSpec) -> Result<CommandWriter> {
        CommandWriter::spawn(spec, &self.shell, Arc::clone(&self.sink))
    }

    /// Run a command to completion
    pub async fn run(&self, spec: &CommandSpec) -> Result<()> {
        process::run(spec, &self.shell, &self.sink).await
    }
}

impl Default for Opener {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl std::fmt::Debug for Opener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Opener")
            .field("shell", &self.shell)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{MemorySink, MockDiagnosticSink};
    use crate::traits::Close;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn opener() -> (Arc<MemorySink>, Opener) {
        let memory = Arc::new(MemorySink::new());
        (memory.clone(), Opener::new(memory))
    }

    #[tokio::test]
    async fn test_stdio_is_wired_to_process_streams() {
        let (_, opener) = opener();
        let reader = opener.open_read("-").await.unwrap();
        assert!(matches!(reader, Reader::Stdin(_)));

        let mut writer = opener.open_write("-").await.unwrap();
        assert!(matches!(writer, Writer::Stdout(_)));
        writer.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_literal_read() {
        let (memory, opener) = opener();
        let mut reader = opener.open_read("text:hello: world").await.unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        reader.close().await.unwrap();
        assert_eq!(out, "hello: world");
        assert!(memory.contains("text hello: world"));
    }

    #[tokio::test]
    async fn test_literal_is_not_writable() {
        let (_, opener) = opener();
        let err = opener.open_write("text:nope").await.unwrap_err();
        assert_eq!(err.io_error().unwrap().kind(), io::ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn test_missing_file_keeps_io_kind() {
        let (_, opener) = opener();
        let err = opener
            .open_read("/nonexistent/tarp/input.tar")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert_eq!(err.io_error().unwrap().kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_fails() {
        let (_, opener) = opener();
        let err = opener
            .open_write("file:/nonexistent/tarp/out.tar")
            .await
            .unwrap_err();
        assert_eq!(err.io_error().unwrap().kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_file_prefix_and_bare_path_are_the_same_file() {
        let (_, opener) = opener();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a:b.txt");

        let mut writer = opener
            .open_write(&format!("file:{}", path.display()))
            .await
            .unwrap();
        writer.write_all(b"colon").await.unwrap();
        writer.close().await.unwrap();

        let mut reader = opener.open_read(path.to_str().unwrap()).await.unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        reader.close().await.unwrap();
        assert_eq!(out, b"colon");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_pipe_read_reaps_child() {
        let (_, opener) = opener();
        let mut reader = opener.open_read("pipe:printf hello").await.unwrap();
        let pid = match &reader {
            Reader::Command(command) => command.id().unwrap(),
            other => panic!("unexpected reader: {other:?}"),
        };

        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        reader.close().await.unwrap();
        assert_eq!(out, "hello");

        assert!(!std::path::Path::new(&format!("/proc/{pid}")).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipe_round_trip_reports_to_sink() {
        let mut mock = MockDiagnosticSink::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_record()
            .withf(|m| m == "spawn reader: printf hi")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        mock.expect_record()
            .withf(|m| m.starts_with("reaped reader: printf hi"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        mock.expect_record()
            .withf(|m| m == "spawn writer: cat > /dev/null")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        mock.expect_record()
            .withf(|m| m == "closing input: cat > /dev/null (2 bytes written)")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        mock.expect_record()
            .withf(|m| m.starts_with("reaped writer: cat > /dev/null"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let opener = Opener::new(Arc::new(mock));
        let mut reader = opener.open_read("pipe:printf hi").await.unwrap();
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await.unwrap();
        reader.close().await.unwrap();

        let mut writer = opener.open_write("pipe:cat > /dev/null").await.unwrap();
        writer.write_all(&data).await.unwrap();
        writer.close().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipe_cat_delivers_bytes_before_close_returns() {
        let (_, opener) = opener();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cat.out");

        let mut writer = opener
            .open_write(&format!("pipe:sleep 0.2; cat > '{}'", path.display()))
            .await
            .unwrap();
        let payload = vec![b'x'; 256 * 1024];
        writer.write_all(&payload).await.unwrap();
        writer.close().await.unwrap();

        // The child has exited, so its output file is complete.
        assert_eq!(std::fs::read(&path).unwrap(), payload);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipe_write_after_close_fails() {
        let (_, opener) = opener();
        let mut writer = opener.open_write("pipe:cat > /dev/null").await.unwrap();
        writer.close().await.unwrap();
        let err = writer.write_all(b"late").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipe_exit_status_surfaces_on_read_close() {
        let (_, opener) = opener();
        let mut reader = opener.open_read("pipe:exit 3").await.unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert!(out.is_empty());

        let err = reader.close().await.unwrap_err();
        assert!(matches!(err, Error::Process { .. }));
        assert_eq!(err.exit_status_code(), Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipe_exit_status_surfaces_on_write_close() {
        let (_, opener) = opener();
        let mut writer = opener
            .open_write("pipe:cat > /dev/null; exit 3")
            .await
            .unwrap();
        writer.write_all(b"all of it").await.unwrap();
        let err = writer.close().await.unwrap_err();
        assert_eq!(err.exit_status_code(), Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_custom_shell() {
        let (memory, opener) = opener();
        let opener = opener.with_shell(Shell {
            program: "/bin/sh".into(),
            flag: "-c".into(),
        });
        let mut reader = opener.open_read("pipe:echo $((1 + 2))").await.unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        reader.close().await.unwrap();
        assert_eq!(out, "3\n");
        assert!(memory.contains("spawn reader: echo $((1 + 2))"));
    }
}
