// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error taxonomy with stable error codes for terminal launches.
//!
//! Every failure a launch transaction can run into is a [`LaunchError`]
//! variant.  Each variant maps to a machine-readable [`ErrorCode`] and to a
//! broad [`ErrorCategory`], so callers that only see a failed outcome can
//! still tell "bad input" apart from "the OS refused to start the process".

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or invalid launch inputs.
    Validation,
    /// Process or thread creation failures.
    Process,
    /// Failures while waiting on readiness or exit.
    Wait,
    /// Launch machinery broke down unexpectedly.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::Process => "process",
            Self::Wait => "wait",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Serialises to a `SCREAMING_SNAKE_CASE` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A required launch input was missing or invalid.
    LaunchInvalidInput,
    /// The OS refused to create the process.
    LaunchSpawnFailed,
    /// The background launch thread could not be created.
    LaunchThreadFailed,
    /// The caller's readiness wait was interrupted.
    LaunchWaitInterrupted,
    /// Waiting for the child's exit failed.
    LaunchExitUnknown,
    /// The launch task ended without reporting readiness.
    LaunchTaskAborted,
}

impl ErrorCode {
    /// Category this code belongs to.
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::LaunchInvalidInput => ErrorCategory::Validation,
            Self::LaunchSpawnFailed | Self::LaunchThreadFailed => ErrorCategory::Process,
            Self::LaunchWaitInterrupted | Self::LaunchExitUnknown => ErrorCategory::Wait,
            Self::LaunchTaskAborted => ErrorCategory::Internal,
        }
    }

    /// Stable string form, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LaunchInvalidInput => "LAUNCH_INVALID_INPUT",
            Self::LaunchSpawnFailed => "LAUNCH_SPAWN_FAILED",
            Self::LaunchThreadFailed => "LAUNCH_THREAD_FAILED",
            Self::LaunchWaitInterrupted => "LAUNCH_WAIT_INTERRUPTED",
            Self::LaunchExitUnknown => "LAUNCH_EXIT_UNKNOWN",
            Self::LaunchTaskAborted => "LAUNCH_TASK_ABORTED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LaunchError
// ---------------------------------------------------------------------------

/// Errors produced while building or executing a launch transaction.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// A required input was missing or did not pass validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The OS refused to create the process.
    #[error("cannot start process `{program}`: {source}")]
    ProcessStart {
        /// Program that was asked to start (first argv element).
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The background launch thread could not be created.
    #[error("failed to create launch thread: {0}")]
    Thread(#[source] std::io::Error),

    /// The caller's wait for the started process was interrupted.
    #[error("wait for started process was interrupted")]
    InterruptedWait,

    /// Waiting for the child's exit failed.
    #[error("failed to wait for process exit: {0}")]
    Wait(#[source] std::io::Error),

    /// The launch task ended before it reported readiness.
    #[error("launch task ended without reporting readiness")]
    TaskAborted,
}

impl LaunchError {
    /// Convenience constructor for [`LaunchError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::LaunchInvalidInput,
            Self::ProcessStart { .. } => ErrorCode::LaunchSpawnFailed,
            Self::Thread(_) => ErrorCode::LaunchThreadFailed,
            Self::InterruptedWait => ErrorCode::LaunchWaitInterrupted,
            Self::Wait(_) => ErrorCode::LaunchExitUnknown,
            Self::TaskAborted => ErrorCode::LaunchTaskAborted,
        }
    }

    /// Category of this error.
    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// Returns `true` for failures caused by the caller's inputs.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result alias used across the launch crates.
pub type Result<T> = std::result::Result<T, LaunchError>;
