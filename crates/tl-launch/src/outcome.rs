// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed results of a launch transaction.

use serde::{Deserialize, Serialize};
use std::fmt;
use tl_error::LaunchError;
use tokio::sync::oneshot;

/// Lifecycle of one launch transaction.
///
/// `Created → Starting → {StartedWithProcess | StartedNoProcess} → Exited`.
/// Only launches that produced a process reach `Exited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchState {
    /// The launch task exists but has not run yet.
    Created,
    /// The launch task is creating the OS process.
    Starting,
    /// A process was created and is running.
    StartedWithProcess,
    /// Nothing was started (no-op launch or start failure).
    StartedNoProcess,
    /// The started process has exited.
    Exited,
}

impl LaunchState {
    /// Returns `true` once readiness has been published.
    pub fn is_started(self) -> bool {
        matches!(
            self,
            Self::StartedWithProcess | Self::StartedNoProcess | Self::Exited
        )
    }
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Starting => "starting",
            Self::StartedWithProcess => "started_with_process",
            Self::StartedNoProcess => "started_no_process",
            Self::Exited => "exited",
        };
        f.write_str(s)
    }
}

/// Exit of a launched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessExit {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ProcessExit {
    /// Returns `true` for exit code zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ProcessExit {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Handle to a process that has been started.
///
/// The child itself stays with the background launch thread, which is the
/// only waiter on it; this handle receives its exit once it happens.
/// Dropping the handle leaves the process running.
#[derive(Debug)]
pub struct StartedProcess {
    pid: u32,
    command_line: String,
    exit: oneshot::Receiver<Result<ProcessExit, LaunchError>>,
}

impl StartedProcess {
    pub(crate) fn new(
        pid: u32,
        command_line: String,
        exit: oneshot::Receiver<Result<ProcessExit, LaunchError>>,
    ) -> Self {
        Self {
            pid,
            command_line,
            exit,
        }
    }

    /// OS process id.
    pub fn id(&self) -> u32 {
        self.pid
    }

    /// Printable command line the process was started with.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Block the calling thread until the process exits.
    ///
    /// Must not be called from within an async runtime; use
    /// [`StartedProcess::exited`] there.
    pub fn wait_for_exit(self) -> Result<ProcessExit, LaunchError> {
        self.exit
            .blocking_recv()
            .map_err(|_| LaunchError::TaskAborted)?
    }

    /// Wait asynchronously until the process exits.
    pub async fn exited(self) -> Result<ProcessExit, LaunchError> {
        self.exit.await.map_err(|_| LaunchError::TaskAborted)?
    }
}

/// Result of a launch: started, nothing to do, or failed.
#[derive(Debug)]
pub enum LaunchOutcome {
    /// A process was started.
    Started(StartedProcess),
    /// The context had no commands; nothing was launched.
    NoOp,
    /// The launch did not happen.
    Failed(LaunchError),
}

impl LaunchOutcome {
    /// Returns `true` if a process was started.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    /// Returns `true` for a no-op launch.
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// The started process, if any.
    pub fn process(&self) -> Option<&StartedProcess> {
        match self {
            Self::Started(p) => Some(p),
            _ => None,
        }
    }

    /// Consume the outcome, keeping only the started process.
    pub fn into_process(self) -> Option<StartedProcess> {
        match self {
            Self::Started(p) => Some(p),
            _ => None,
        }
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&LaunchError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// State reached at readiness.
    pub fn state(&self) -> LaunchState {
        match self {
            Self::Started(_) => LaunchState::StartedWithProcess,
            Self::NoOp | Self::Failed(_) => LaunchState::StartedNoProcess,
        }
    }
}
