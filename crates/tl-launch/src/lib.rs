// SPDX-License-Identifier: MIT OR Apache-2.0
//! tl-launch
//!
//! Launches a script in an external terminal window on a dedicated
//! background thread.
//!
//! [`ProcessLauncher::execute`] blocks only until the OS process has been
//! created (or is known not to be created) and then returns a
//! [`LaunchOutcome`]. The background thread keeps ownership of the child,
//! waits for it and forwards its exit to the [`StartedProcess`] handle.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod gate;
mod launcher;
mod outcome;
mod sink;

pub use context::{LaunchContext, LaunchContextBuilder};
pub use gate::WaitInterrupter;
pub use launcher::{LaunchRequest, PendingLaunch, ProcessLauncher};
pub use outcome::{LaunchOutcome, LaunchState, ProcessExit, StartedProcess};
pub use sink::{DiagnosticLine, DiagnosticsSink, MemorySink, TracingSink};
pub use tl_error::{ErrorCode, LaunchError};
