// SPDX-License-Identifier: MIT OR Apache-2.0
//! tl-command
//!
//! Synthesizes the argument vector that opens a terminal emulator, runs a
//! script inside a starter shell, captures its exit status and optionally
//! pauses before the window closes.
//!
//! Synthesis is pure: the same [`SynthesisInput`] always yields the same
//! argv, and blank terminal or starter commands degrade to a direct
//! invocation instead of failing.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod shape;
mod snippet;

pub use shape::{DEFAULT_STARTER_COMMAND, Platform, TerminalShape, UnixShape, WindowsShape};
pub use snippet::{EXIT_STATUS_VAR, PRESS_ENTER_PROMPT, WaitPolicy, script_snippet};

use std::path::Path;

/// Everything synthesis needs, borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    /// Command that opens a new terminal window (may be blank).
    pub terminal_command: &'a str,
    /// Shell invocation run inside the terminal (may be blank).
    pub starter_command: &'a str,
    /// Script to run.
    pub file: &'a Path,
    /// Free-form parameters appended to the script invocation.
    pub params: &'a str,
    /// Pause behavior after the script exits.
    pub wait: WaitPolicy,
}

impl<'a> SynthesisInput<'a> {
    /// Input for `file` with blank commands, no params and no pauses.
    pub fn new(file: &'a Path) -> Self {
        Self {
            terminal_command: "",
            starter_command: "",
            file,
            params: "",
            wait: WaitPolicy::NEVER,
        }
    }
}

/// Turns launch inputs into a platform-correct argument vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandSynthesizer {
    platform: Platform,
}

impl CommandSynthesizer {
    /// Synthesizer for an explicit platform.
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Synthesizer for the running platform.
    pub fn for_current_platform() -> Self {
        Self::new(Platform::current())
    }

    /// Platform this synthesizer targets.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Produce the argument vector for `input`.
    ///
    /// With a terminal command the caller line is wrapped by the platform's
    /// [`TerminalShape`]; without one the starter is invoked directly with
    /// the snippet as its last argument.
    pub fn synthesize(&self, input: &SynthesisInput<'_>) -> Vec<String> {
        let shape = self.platform.shape();
        let snippet = script_snippet(input.file, input.params, input.wait);

        let starter = match input.starter_command.trim() {
            "" => DEFAULT_STARTER_COMMAND,
            s => s,
        };

        match input.terminal_command.trim() {
            "" => starter
                .split_whitespace()
                .map(str::to_string)
                .chain(std::iter::once(snippet))
                .collect(),
            terminal => {
                let caller = format!("{starter} {}", shape.quote_snippet(&snippet));
                shape.wrap_in_terminal(terminal, &caller)
            }
        }
    }
}

/// Printable form of an argument vector, for diagnostics only.
///
/// Tokens are joined with single spaces; the result is not meant to be
/// parsed back into argv.
pub fn command_string<S: AsRef<str>>(commands: &[S]) -> String {
    commands
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
