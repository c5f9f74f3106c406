// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-platform terminal strategies.
//!
//! Each [`TerminalShape`] decides how the caller line (starter + quoted
//! snippet) is handed to the terminal emulator, and what a launch looks like
//! when no terminal is configured.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Starter used when the configured one is blank.
pub const DEFAULT_STARTER_COMMAND: &str = "bash --login -c";

/// Strategy for turning a starter, a snippet and a terminal command into argv.
pub trait TerminalShape: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Terminal command the configuration layer falls back to.
    fn default_terminal_command(&self) -> &'static str;

    /// Quote `snippet` so it survives as one argument of the starter.
    fn quote_snippet(&self, snippet: &str) -> String;

    /// Argument vector opening `terminal` and running `caller` inside it.
    fn wrap_in_terminal(&self, terminal: &str, caller: &str) -> Vec<String>;
}

/// POSIX desktops: hand the line to `bash -c` and background the emulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixShape;

impl TerminalShape for UnixShape {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn default_terminal_command(&self) -> &'static str {
        "x-terminal-emulator -e"
    }

    fn quote_snippet(&self, snippet: &str) -> String {
        single_quote(snippet)
    }

    fn wrap_in_terminal(&self, terminal: &str, caller: &str) -> Vec<String> {
        vec![
            "bash".to_string(),
            "-c".to_string(),
            format!("{terminal} {caller} &"),
        ]
    }
}

/// Windows: hand the line to `cmd.exe /C` as one double-quoted argument.
///
/// The snippet is single-quoted for the starter shell, so the double quotes
/// inside it stay balanced for cmd.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsShape;

impl TerminalShape for WindowsShape {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn default_terminal_command(&self) -> &'static str {
        "start"
    }

    fn quote_snippet(&self, snippet: &str) -> String {
        single_quote(snippet)
    }

    fn wrap_in_terminal(&self, terminal: &str, caller: &str) -> Vec<String> {
        vec![
            "cmd.exe".to_string(),
            "/C".to_string(),
            format!("\"{terminal} {caller}\""),
        ]
    }
}

/// POSIX single quoting; an embedded `'` becomes `'\''`.
fn single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Target platform for command synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Linux, macOS and other POSIX desktops.
    Unix,
    /// Windows.
    Windows,
}

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// Strategy implementing this platform's terminal conventions.
    pub fn shape(self) -> &'static dyn TerminalShape {
        match self {
            Self::Unix => &UnixShape,
            Self::Windows => &WindowsShape,
        }
    }

    /// Terminal command used when none is configured.
    pub fn default_terminal_command(self) -> &'static str {
        self.shape().default_terminal_command()
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shape().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_quotes_single_quotes() {
        assert_eq!(UnixShape.quote_snippet("echo 'hi'"), "'echo '\\''hi'\\'''");
    }

    #[test]
    fn windows_single_quotes_for_the_starter_shell() {
        assert_eq!(
            WindowsShape.quote_snippet("cd \"C:/a b\";echo 'hi'"),
            "'cd \"C:/a b\";echo '\\''hi'\\'''"
        );
    }

    #[test]
    fn unix_backgrounds_the_emulator() {
        let argv = UnixShape.wrap_in_terminal("x-terminal-emulator -e", "bash -c 'x'");
        assert_eq!(argv, ["bash", "-c", "x-terminal-emulator -e bash -c 'x' &"]);
    }

    #[test]
    fn windows_uses_cmd_with_one_quoted_argument() {
        let argv = WindowsShape.wrap_in_terminal("start", "bash -c 'x'");
        assert_eq!(argv, ["cmd.exe", "/C", "\"start bash -c 'x'\""]);
    }

    #[test]
    fn platform_display_and_defaults() {
        assert_eq!(Platform::Unix.to_string(), "unix");
        assert_eq!(Platform::Windows.to_string(), "windows");
        assert_eq!(
            Platform::Unix.default_terminal_command(),
            "x-terminal-emulator -e"
        );
        assert_eq!(Platform::Windows.default_terminal_command(), "start");
    }

    #[test]
    fn current_matches_cfg() {
        assert_eq!(Platform::current() == Platform::Windows, cfg!(windows));
    }
}
