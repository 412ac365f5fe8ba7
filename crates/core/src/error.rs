//! Error types for tarp-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type alias for tarp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for tarp-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Resource could not be created: missing file, permission denied, spawn failure
    #[error("Cannot open '{descriptor}': {source}")]
    Open {
        descriptor: String,
        #[source]
        source: io::Error,
    },

    /// A read or write failed mid-stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Flushing or closing the underlying handle failed
    #[error("Cannot close '{descriptor}': {source}")]
    Close {
        descriptor: String,
        #[source]
        source: io::Error,
    },

    /// A spawned command exited nonzero or was killed by a signal
    #[error("Command '{command}' {}", describe_exit(.code, .signal))]
    Process {
        command: String,
        code: Option<i32>,
        signal: Option<i32>,
    },

    /// close() was called on a stream that is already closed
    #[error("Stream is already closed")]
    Closed,

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Malformed shard name pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Option value outside its accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Build a `Process` error from a non-success exit status
    pub fn from_status(command: impl Into<String>, status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        Error::Process {
            command: command.into(),
            code: status.code(),
            signal,
        }
    }

    /// The underlying io error, if this error wraps one
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Error::Open { source, .. } | Error::Close { source, .. } => Some(source),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }

    /// Exit code of the failed command, for `Process` errors that exited normally
    pub fn exit_status_code(&self) -> Option<i32> {
        match self {
            Error::Process { code, .. } => *code,
            _ => None,
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_)
            | Error::TomlParse(_)
            | Error::InvalidPattern(_)
            | Error::InvalidArgument(_) => 2, // UsageError
            Error::Open { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => 4, // PermissionDenied
                io::ErrorKind::NotFound => 5,         // NotFound
                _ => 1,
            },
            Error::Io(_) | Error::Close { .. } => 3, // IoError
            Error::Process { .. } => 6,              // CommandFailed
            _ => 1,                                  // GeneralError
        }
    }
}

fn describe_exit(code: &Option<i32>, signal: &Option<i32>) -> String {
    match (*code, *signal) {
        (Some(code), _) => format!("exited with status {code}"),
        (None, Some(signal)) => format!("was terminated by signal {signal}"),
        (None, None) => "terminated abnormally".to_string(),
    }
}
