//! Resource descriptor parsing
//!
//! Handles classification of resource strings:
//! `-`, `text:<literal>`, `pipe:<shell command>`, `file:<path>` or a bare path.
//! Parsing is total: anything unrecognized is a filesystem path.

use std::path::Path;

const STDIO: &str = "-";
const TEXT_PREFIX: &str = "text:";
const PIPE_PREFIX: &str = "pipe:";
const FILE_PREFIX: &str = "file:";

/// Access mechanism selected by a descriptor's prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// The process's own standard input or output
    Stdio,
    /// Inline literal content
    Literal,
    /// A shell command connected through a pipe
    Subprocess,
    /// A filesystem path
    File,
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Scheme::Stdio => "stdio",
            Scheme::Literal => "text",
            Scheme::Subprocess => "pipe",
            Scheme::File => "file",
        };
        f.write_str(name)
    }
}

/// A resolved resource descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor<'a> {
    /// Access scheme
    pub scheme: Scheme,
    /// Remainder after the scheme prefix (empty for stdio)
    pub payload: &'a str,
}

impl<'a> Descriptor<'a> {
    /// Payload interpreted as a filesystem path
    pub fn path(&self) -> &'a Path {
        Path::new(self.payload)
    }
}

impl std::fmt::Display for Descriptor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.scheme {
            Scheme::Stdio => f.write_str(STDIO),
            Scheme::Literal => write!(f, "{TEXT_PREFIX}{}", self.payload),
            Scheme::Subprocess => write!(f, "{PIPE_PREFIX}{}", self.payload),
            Scheme::File => f.write_str(self.payload),
        }
    }
}

/// Resolve a descriptor string into its scheme and payload
///
/// First match wins:
/// 1. exactly `-` is stdio
/// 2. `text:` prefix is a literal
/// 3. `pipe:` prefix is a subprocess
/// 4. anything else is a path, with one leading `file:` stripped
pub fn resolve(descriptor: &str) -> Descriptor<'_> {
    if descriptor == STDIO {
        return Descriptor {
            scheme: Scheme::Stdio,
            payload: "",
        };
    }

    if let Some(text) = descriptor.strip_prefix(TEXT_PREFIX) {
        return Descriptor {
            scheme: Scheme::Literal,
            payload: text,
        };
    }

    if let Some(command) = descriptor.strip_prefix(PIPE_PREFIX) {
        return Descriptor {
            scheme: Scheme::Subprocess,
            payload: command,
        };
    }

    Descriptor {
        scheme: Scheme::File,
        payload: descriptor.strip_prefix(FILE_PREFIX).unwrap_or(descriptor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_stdio() {
        let d = resolve("-");
        assert_eq!(d.scheme, Scheme::Stdio);
        assert_eq!(d.payload, "");
    }

    #[test]
    fn test_resolve_dash_prefix_is_a_path() {
        let d = resolve("-foo");
        assert_eq!(d.scheme, Scheme::File);
        assert_eq!(d.payload, "-foo");
    }

    #[test]
    fn test_resolve_literal() {
        let d = resolve("text:hello world");
        assert_eq!(d.scheme, Scheme::Literal);
        assert_eq!(d.payload, "hello world");

        let d = resolve("text:");
        assert_eq!(d.scheme, Scheme::Literal);
        assert_eq!(d.payload, "");
    }

    #[test]
    fn test_resolve_pipe() {
        let d = resolve("pipe:gsutil cp - gs://bucket/shard-000001.tar");
        assert_eq!(d.scheme, Scheme::Subprocess);
        assert_eq!(d.payload, "gsutil cp - gs://bucket/shard-000001.tar");
    }

    #[test]
    fn test_resolve_file_prefix() {
        let d = resolve("file:/tmp/out.tar");
        assert_eq!(d.scheme, Scheme::File);
        assert_eq!(d.path(), Path::new("/tmp/out.tar"));
    }

    #[test]
    fn test_resolve_file_prefix_stripped_once() {
        let d = resolve("file:file:x");
        assert_eq!(d.payload, "file:x");
    }

    #[test]
    fn test_resolve_bare_path() {
        let d = resolve("shards/split-000000.tar");
        assert_eq!(d.scheme, Scheme::File);
        assert_eq!(d.payload, "shards/split-000000.tar");
    }

    #[test]
    fn test_resolve_unknown_prefix_falls_through() {
        let d = resolve("gs://bucket/key");
        assert_eq!(d.scheme, Scheme::File);
        assert_eq!(d.payload, "gs://bucket/key");

        let d = resolve("a:b:c");
        assert_eq!(d.scheme, Scheme::File);
    }

    #[test]
    fn test_resolve_prefix_is_case_sensitive() {
        assert_eq!(resolve("PIPE:cat").scheme, Scheme::File);
    }

    #[test]
    fn test_descriptor_display() {
        assert_eq!(resolve("-").to_string(), "-");
        assert_eq!(resolve("pipe:cat").to_string(), "pipe:cat");
        assert_eq!(resolve("file:out.tar").to_string(), "out.tar");
    }
}
