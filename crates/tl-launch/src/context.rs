// SPDX-License-Identifier: MIT OR Apache-2.0
//! Immutable launch contexts and their builder.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tl_command::{CommandSynthesizer, Platform, SynthesisInput, WaitPolicy, command_string};
use tl_config::LaunchPreferences;
use tl_error::LaunchError;

/// Fully resolved inputs of one launch transaction.
///
/// Built by [`LaunchContextBuilder`]; fields never change afterwards. The
/// wait policy is already baked into [`LaunchContext::commands`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    file: PathBuf,
    params: String,
    commands: Vec<String>,
    working_directory: PathBuf,
    environment: BTreeMap<String, String>,
    waiting_always: bool,
    waiting_on_errors: bool,
    platform: Platform,
}

impl LaunchContext {
    /// Start building a context.
    pub fn builder() -> LaunchContextBuilder {
        LaunchContextBuilder::new()
    }

    /// Target script.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// File name of the target script, for thread names and diagnostics.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string())
    }

    /// Free-form params appended to the script invocation.
    pub fn params(&self) -> &str {
        &self.params
    }

    /// Resolved argument vector; empty means "nothing to launch".
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Printable form of [`LaunchContext::commands`].
    pub fn command_string(&self) -> String {
        command_string(&self.commands)
    }

    /// Returns `true` when there is nothing to launch.
    pub fn is_noop(&self) -> bool {
        self.commands.is_empty()
    }

    /// Directory the process starts in (the script's parent directory).
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Variables overlaid on the inherited environment.
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Whether the terminal pauses after every run.
    pub fn waiting_always(&self) -> bool {
        self.waiting_always
    }

    /// Whether the terminal pauses after failing runs.
    pub fn waiting_on_errors(&self) -> bool {
        self.waiting_on_errors
    }

    /// Platform the commands were synthesized for.
    pub fn platform(&self) -> Platform {
        self.platform
    }
}

/// One-shot factory for [`LaunchContext`].
///
/// `build` consumes the builder, so one builder yields at most one context.
#[derive(Debug, Clone, Default)]
pub struct LaunchContextBuilder {
    file: Option<PathBuf>,
    params: String,
    terminal_command: String,
    starter_command: String,
    waiting_always: bool,
    waiting_on_errors: bool,
    environment: BTreeMap<String, String>,
    platform: Option<Platform>,
    commands: Option<Vec<String>>,
}

impl LaunchContextBuilder {
    /// Builder with empty params, empty overlay and both wait flags off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-filled with terminal, starter, wait flags and environment
    /// from `prefs`.
    pub fn from_preferences(prefs: &LaunchPreferences) -> Self {
        Self::new()
            .terminal_command(prefs.terminal_command())
            .starter_command(prefs.starter_command())
            .waiting_always(prefs.waiting_always())
            .waiting_on_errors(prefs.waiting_on_errors())
            .environment(prefs.environment.clone())
    }

    /// Script to launch (required).
    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Params appended to the script invocation.
    pub fn params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }

    /// Command that opens a terminal window; blank means direct invocation.
    pub fn terminal_command(mut self, command: impl Into<String>) -> Self {
        self.terminal_command = command.into();
        self
    }

    /// Shell invocation inside the terminal; blank means the default starter.
    pub fn starter_command(mut self, command: impl Into<String>) -> Self {
        self.starter_command = command.into();
        self
    }

    /// Pause after every run.
    pub fn waiting_always(mut self, enabled: bool) -> Self {
        self.waiting_always = enabled;
        self
    }

    /// Pause after failing runs.
    pub fn waiting_on_errors(mut self, enabled: bool) -> Self {
        self.waiting_on_errors = enabled;
        self
    }

    /// Replace the environment overlay.
    pub fn environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Add one variable to the environment overlay.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Synthesize for `platform` instead of the running one.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Use an explicit argument vector instead of synthesizing one.
    ///
    /// An empty vector yields a no-op launch.
    pub fn commands(mut self, commands: Vec<String>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Validate the inputs, synthesize the commands and freeze the context.
    pub fn build(self) -> Result<LaunchContext, LaunchError> {
        let file = self
            .file
            .ok_or_else(|| LaunchError::validation("file was not set"))?;
        if !file.exists() {
            return Err(LaunchError::validation(format!(
                "file does not exist: {}",
                file.display()
            )));
        }
        for key in self.environment.keys() {
            if key.is_empty() || key.contains('=') || key.contains('\0') {
                return Err(LaunchError::validation(format!(
                    "invalid environment variable name '{key}'"
                )));
            }
        }

        let working_directory = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let platform = self.platform.unwrap_or_default();

        let commands = match self.commands {
            Some(commands) => commands,
            None => CommandSynthesizer::new(platform).synthesize(&SynthesisInput {
                terminal_command: &self.terminal_command,
                starter_command: &self.starter_command,
                file: &file,
                params: &self.params,
                wait: WaitPolicy::new(self.waiting_always, self.waiting_on_errors),
            }),
        };

        Ok(LaunchContext {
            file,
            params: self.params,
            commands,
            working_directory,
            environment: self.environment,
            waiting_always: self.waiting_always,
            waiting_on_errors: self.waiting_on_errors,
            platform,
        })
    }
}
