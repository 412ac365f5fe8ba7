//! Output formatter for human-readable and JSON output
//!
//! Status lines never share stdout with payload data: when a command streams
//! its data to `-`, every message the formatter prints is moved to stderr.

use serde::Serialize;
use tarp_core::ShardInfo;

use super::OutputConfig;

/// Formatter for CLI output
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
    stdout_reserved: bool,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            stdout_reserved: false,
        }
    }

    /// Route status output to stderr because stdout carries data
    pub fn with_stdout_reserved(mut self, reserved: bool) -> Self {
        self.stdout_reserved = reserved;
        self
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    fn emit(&self, line: &str) {
        if self.stdout_reserved {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    fn marked(&self, color: &str, mark: &str, message: &str) -> String {
        if self.colors_enabled() {
            format!("\x1b[{color}m{mark}\x1b[0m {message}")
        } else {
            format!("{mark} {message}")
        }
    }

    /// Output a success message
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        self.emit(&self.marked("32", "✓", message));
    }

    /// Output an error message
    ///
    /// Errors are always printed to stderr, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
        } else {
            eprintln!("{}", self.marked("31", "✗", message));
        }
    }

    /// Output a warning message
    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        eprintln!("{}", self.marked("33", "⚠", message));
    }

    /// One line describing a completed shard
    pub fn shard(&self, info: &ShardInfo) {
        if self.config.quiet || self.config.json {
            return;
        }
        self.emit(&format!(
            "{} ({} records, {})",
            info.name,
            info.records,
            humansize::format_size(info.bytes, humansize::BINARY)
        ));
    }

    /// Output JSON directly
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => self.emit(&json),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatter_default() {
        let formatter = Formatter::default();
        assert!(!formatter.is_json());
        assert!(formatter.colors_enabled());
        assert!(!formatter.stdout_reserved);
    }

    #[test]
    fn test_formatter_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        assert!(formatter.is_json());
        assert!(!formatter.colors_enabled());
    }

    #[test]
    fn test_marked_without_color() {
        let config = OutputConfig {
            no_color: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        assert!(!formatter.colors_enabled());
        assert_eq!(formatter.marked("32", "✓", "done"), "✓ done");
    }

    #[test]
    fn test_marked_with_color() {
        let formatter = Formatter::default();
        assert_eq!(formatter.marked("31", "✗", "failed"), "\x1b[31m✗\x1b[0m failed");
    }

    #[test]
    fn test_stdout_reserved() {
        let formatter = Formatter::default().with_stdout_reserved(true);
        assert!(formatter.stdout_reserved);
    }
}
