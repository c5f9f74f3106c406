// SPDX-License-Identifier: MIT OR Apache-2.0
//! Background process launcher.
//!
//! Each launch gets one dedicated thread that creates the OS process,
//! publishes readiness, then waits for the child's exit. The caller blocks
//! only until readiness, never until the process finishes.

use crate::context::{LaunchContext, LaunchContextBuilder};
use crate::gate::{WaitInterrupter, PublishGuard, StartGate};
use crate::outcome::{LaunchOutcome, LaunchState, ProcessExit, StartedProcess};
use crate::sink::DiagnosticsSink;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tl_command::{WaitPolicy, command_string};
use tl_config::LaunchPreferences;
use tl_error::LaunchError;
use tokio::sync::oneshot;
use tracing::debug;

/// Launch inputs as a caller such as a UI action hands them over.
///
/// Unlike a [`LaunchContext`], the file may be missing; [`ProcessLauncher::launch`]
/// reports that instead of failing loudly.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    /// Script to launch.
    pub file: Option<PathBuf>,
    /// Params appended to the script invocation.
    pub params: String,
    /// Command that opens a terminal window.
    pub terminal_command: String,
    /// Shell invocation inside the terminal.
    pub starter_command: String,
    /// Variables overlaid on the inherited environment.
    pub environment: BTreeMap<String, String>,
    /// Pause behavior after the script exits.
    pub wait: WaitPolicy,
}

impl LaunchRequest {
    /// Request for `file` with everything else empty.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::default()
        }
    }

    /// Request resolved from stored preferences.
    pub fn from_preferences(
        file: Option<PathBuf>,
        params: impl Into<String>,
        prefs: &LaunchPreferences,
    ) -> Self {
        Self {
            file,
            params: params.into(),
            terminal_command: prefs.terminal_command().to_string(),
            starter_command: prefs.starter_command().to_string(),
            environment: prefs.environment.clone(),
            wait: prefs.wait_policy(),
        }
    }

    fn into_builder(self, file: PathBuf) -> LaunchContextBuilder {
        LaunchContext::builder()
            .file(file)
            .params(self.params)
            .terminal_command(self.terminal_command)
            .starter_command(self.starter_command)
            .waiting_always(self.wait.always)
            .waiting_on_errors(self.wait.on_errors)
            .environment(self.environment)
    }
}

/// Executes launch contexts on dedicated background threads.
#[derive(Clone)]
pub struct ProcessLauncher {
    sink: Arc<dyn DiagnosticsSink>,
    show_meta_info: bool,
}

impl std::fmt::Debug for ProcessLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessLauncher")
            .field("show_meta_info", &self.show_meta_info)
            .finish_non_exhaustive()
    }
}

impl ProcessLauncher {
    /// Launcher reporting to `sink`, with meta info disabled.
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            sink,
            show_meta_info: false,
        }
    }

    /// Launcher reporting to `sink`, with meta info taken from `prefs`.
    pub fn from_preferences(sink: Arc<dyn DiagnosticsSink>, prefs: &LaunchPreferences) -> Self {
        Self::new(sink).with_meta_info(prefs.show_meta_info())
    }

    /// Print the synthesized command and exit codes to the sink.
    pub fn with_meta_info(mut self, enabled: bool) -> Self {
        self.show_meta_info = enabled;
        self
    }

    /// Build a context from `request` and execute it.
    ///
    /// A missing file or invalid inputs are reported to the sink and
    /// returned as [`LaunchOutcome::Failed`]; no thread is spawned.
    pub fn launch(&self, request: LaunchRequest) -> LaunchOutcome {
        let Some(file) = request.file.clone() else {
            let err = LaunchError::validation("file was not set");
            self.sink.error("File was null", Some(&err));
            return LaunchOutcome::Failed(err);
        };
        match request.into_builder(file).build() {
            Ok(context) => self.execute(&context),
            Err(err) => {
                self.sink.error("Cannot create launch context", Some(&err));
                LaunchOutcome::Failed(err)
            }
        }
    }

    /// Execute `context` and block until its process has started, or is
    /// known not to start.
    pub fn execute(&self, context: &LaunchContext) -> LaunchOutcome {
        match self.spawn(context) {
            Ok(pending) => pending.wait_for_started_process(),
            Err(err) => LaunchOutcome::Failed(err),
        }
    }

    /// Start the background launch thread without waiting for readiness.
    pub fn spawn(&self, context: &LaunchContext) -> Result<PendingLaunch, LaunchError> {
        let gate = StartGate::new();
        let task = LaunchTask {
            commands: context.commands().to_vec(),
            working_directory: context.working_directory().to_path_buf(),
            environment: context.environment().clone(),
            sink: self.sink.clone(),
            show_meta_info: self.show_meta_info,
            gate: gate.clone(),
        };

        thread::Builder::new()
            .name(format!("launch in terminal: {}", context.file_name()))
            .spawn(move || task.run())
            .map_err(|e| {
                let err = LaunchError::Thread(e);
                self.sink.error("Cannot create launch thread", Some(&err));
                err
            })?;

        debug!(target: "tl.launch", file = %context.file().display(), "launch thread started");
        Ok(PendingLaunch { gate })
    }
}

/// A launch whose readiness has not been collected yet.
#[derive(Debug)]
pub struct PendingLaunch {
    gate: Arc<StartGate>,
}

impl PendingLaunch {
    /// Handle for interrupting the wait and observing the launch state.
    pub fn interrupter(&self) -> WaitInterrupter {
        WaitInterrupter::new(self.gate.clone())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LaunchState {
        self.gate.state()
    }

    /// Block until the process has started or is known not to start.
    ///
    /// There is no timeout: if the launch thread wedges inside process
    /// creation, this blocks until [`WaitInterrupter::interrupt`] is called.
    pub fn wait_for_started_process(self) -> LaunchOutcome {
        let outcome = self.gate.wait();
        if let LaunchOutcome::Failed(LaunchError::InterruptedWait) = outcome {
            debug!(target: "tl.launch", "wait for started process interrupted");
        }
        outcome
    }

    /// Like [`PendingLaunch::wait_for_started_process`], keeping only the
    /// started process.
    pub fn wait_for_started_process_or_none(self) -> Option<StartedProcess> {
        self.wait_for_started_process().into_process()
    }

    /// Wait at most `timeout`; on expiry the pending launch is handed back.
    pub fn wait_timeout(self, timeout: Duration) -> Result<LaunchOutcome, PendingLaunch> {
        match self.gate.wait_timeout(timeout) {
            Some(outcome) => Ok(outcome),
            None => Err(self),
        }
    }
}

/// Execution record owned by one background thread.
struct LaunchTask {
    commands: Vec<String>,
    working_directory: PathBuf,
    environment: BTreeMap<String, String>,
    sink: Arc<dyn DiagnosticsSink>,
    show_meta_info: bool,
    gate: Arc<StartGate>,
}

impl LaunchTask {
    fn run(self) {
        let _guard = PublishGuard::new(self.gate.clone());
        self.gate.set_state(LaunchState::Starting);

        let Some((program, args)) = self.commands.split_first() else {
            debug!(target: "tl.launch", "no commands, nothing to launch");
            self.gate.publish(LaunchOutcome::NoOp);
            return;
        };

        let command_line = command_string(&self.commands);
        let mut cmd = build_command(program, args, &self.working_directory, &self.environment);

        if self.show_meta_info {
            self.sink.println(">>> Launch Terminal:");
            self.sink.println(&format!("    {command_line}"));
        }
        debug!(target: "tl.launch", command = %command_line, "spawning process");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = LaunchError::ProcessStart {
                    program: program.clone(),
                    source,
                };
                self.sink
                    .error("Cannot start real runtime process", Some(&err));
                self.gate.publish(LaunchOutcome::Failed(err));
                return;
            }
        };

        let (exit_tx, exit_rx) = oneshot::channel();
        let pid = child.id();
        self.gate.publish(LaunchOutcome::Started(StartedProcess::new(
            pid,
            command_line,
            exit_rx,
        )));

        let report = match child.wait() {
            Ok(status) => {
                let exit = ProcessExit::from(status);
                if self.show_meta_info {
                    self.sink
                        .println(&format!("Bash process terminated with exit code:{exit}"));
                }
                debug!(target: "tl.launch", pid, code = ?exit.code, "process exited");
                Ok(exit)
            }
            Err(e) => {
                let err = LaunchError::Wait(e);
                self.sink.error("Cannot wait for process exit", Some(&err));
                Err(err)
            }
        };
        self.gate.set_state(LaunchState::Exited);
        // Nobody may be listening for the exit any more.
        let _ = exit_tx.send(report);
    }
}

fn build_command(
    program: &str,
    args: &[String],
    working_directory: &Path,
    environment: &BTreeMap<String, String>,
) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(working_directory)
        .envs(environment)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    cmd
}
