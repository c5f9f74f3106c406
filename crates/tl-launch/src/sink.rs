// SPDX-License-Identifier: MIT OR Apache-2.0
//! Diagnostics sinks receiving human-readable launch output.

use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info};

/// Receives console lines and errors produced by a launch.
///
/// Implementations must be cheap to call from the background launch thread.
pub trait DiagnosticsSink: Send + Sync {
    /// Print one console line (synthesized command, exit codes).
    fn println(&self, line: &str);

    /// Report an error, optionally with its cause.
    fn error(&self, message: &str, cause: Option<&(dyn Error + 'static)>);
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for Arc<T> {
    fn println(&self, line: &str) {
        (**self).println(line);
    }

    fn error(&self, message: &str, cause: Option<&(dyn Error + 'static)>) {
        (**self).error(message, cause);
    }
}

/// Sink forwarding to `tracing`: console lines at info on `tl.console`,
/// errors at error on `tl.launch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn println(&self, line: &str) {
        info!(target: "tl.console", "{line}");
    }

    fn error(&self, message: &str, cause: Option<&(dyn Error + 'static)>) {
        match cause {
            Some(cause) => error!(target: "tl.launch", error = %cause, "{message}"),
            None => error!(target: "tl.launch", "{message}"),
        }
    }
}

/// One entry recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticLine {
    /// A console line.
    Console(String),
    /// An error with its rendered cause.
    Error {
        /// Error message.
        message: String,
        /// `Display` of the cause, if one was given.
        cause: Option<String>,
    },
}

/// Sink that records everything in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<DiagnosticLine>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded entry, in order.
    pub fn lines(&self) -> Vec<DiagnosticLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded console lines only.
    pub fn console_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| match l {
                DiagnosticLine::Console(s) => Some(s),
                DiagnosticLine::Error { .. } => None,
            })
            .collect()
    }

    /// Recorded error messages only.
    pub fn error_messages(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| match l {
                DiagnosticLine::Error { message, .. } => Some(message),
                DiagnosticLine::Console(_) => None,
            })
            .collect()
    }

    fn push(&self, line: DiagnosticLine) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

impl DiagnosticsSink for MemorySink {
    fn println(&self, line: &str) {
        self.push(DiagnosticLine::Console(line.to_string()));
    }

    fn error(&self, message: &str, cause: Option<&(dyn Error + 'static)>) {
        self.push(DiagnosticLine::Error {
            message: message.to_string(),
            cause: cause.map(ToString::to_string),
        });
    }
}
