//! Diagnostic sink
//!
//! Components record diagnostic messages through an injected sink instead of
//! a global logger. Recording is observational only.

use std::sync::{Arc, Mutex};

/// Capability for recording diagnostic messages
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticSink: Send + Sync {
    /// Record one message
    fn record(&self, message: &str);
}

/// Shared handle to a diagnostic sink
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Forwards messages to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, message: &str) {
        tracing::debug!(target: "tarp::resource", "{message}");
    }
}

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded messages
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether any recorded message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}
