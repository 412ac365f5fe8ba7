//! Exit code definitions for tarp CLI
//!
//! Scripts depend on these values; renumbering one is a breaking change.

use tarp_core::Error;

/// Exit codes for the tarp CLI application.
///
/// These codes follow a consistent convention to allow scripts and automation
/// to handle different error scenarios appropriately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// General/unspecified error
    GeneralError = 1,

    /// User input error: invalid arguments, malformed pattern, bad config
    UsageError = 2,

    /// A read, write or close failed mid-stream
    IoError = 3,

    /// Permission denied while opening a resource
    PermissionDenied = 4,

    /// Input file does not exist
    NotFound = 5,

    /// An external command exited nonzero or was killed by a signal
    CommandFailed = 6,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::IoError),
            4 => Some(Self::PermissionDenied),
            5 => Some(Self::NotFound),
            6 => Some(Self::CommandFailed),
            _ => None,
        }
    }

    /// Exit code matching a core error
    pub fn from_error(error: &Error) -> Self {
        Self::from_i32(error.exit_code()).unwrap_or(Self::GeneralError)
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments or configuration",
            Self::IoError => "I/O error while transferring data",
            Self::PermissionDenied => "Permission denied",
            Self::NotFound => "Resource not found",
            Self::CommandFailed => "External command failed",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::UsageError.as_i32(), 2);
        assert_eq!(ExitCode::IoError.as_i32(), 3);
        assert_eq!(ExitCode::PermissionDenied.as_i32(), 4);
        assert_eq!(ExitCode::NotFound.as_i32(), 5);
        assert_eq!(ExitCode::CommandFailed.as_i32(), 6);
    }

    #[test]
    fn test_exit_code_from_i32() {
        assert_eq!(ExitCode::from_i32(0), Some(ExitCode::Success));
        assert_eq!(ExitCode::from_i32(3), Some(ExitCode::IoError));
        assert_eq!(ExitCode::from_i32(6), Some(ExitCode::CommandFailed));
        assert_eq!(ExitCode::from_i32(99), None);
    }

    #[test]
    fn test_exit_code_from_error() {
        let err = Error::Process {
            command: "exit 3".into(),
            code: Some(3),
            signal: None,
        };
        assert_eq!(ExitCode::from_error(&err), ExitCode::CommandFailed);

        let err = Error::Open {
            descriptor: "missing.tar".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);

        let err = Error::InvalidPattern("x".into());
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);
    }

    #[test]
    fn test_exit_code_display() {
        let display = format!("{}", ExitCode::Success);
        assert!(display.contains("0"));
        assert!(display.contains("successfully"));

        let display = format!("{}", ExitCode::CommandFailed);
        assert!(display.contains("6"));
        assert!(display.contains("command failed"));
    }
}
