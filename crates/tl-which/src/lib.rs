// SPDX-License-Identifier: MIT OR Apache-2.0
//! Executable discovery in `PATH` for terminal emulators and shells.
//!
//! Preferences store whole command lines (`x-terminal-emulator -e`,
//! `bash --login -c`); these helpers resolve the program part of such a
//! line so configuration validation can warn before a launch fails.

use std::path::{Path, PathBuf};

/// Locate an executable by name, similarly to shell `which`.
///
/// If `bin` contains path separators, it is treated as a direct path.
/// On Unix only files with an execute bit set are reported.
pub fn which(bin: &str) -> Option<PathBuf> {
    let candidate = Path::new(bin);
    if has_path(candidate) {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).find_map(|dir| resolve_in_dir(&dir, bin))
}

/// First whitespace-separated token of a command line, if any.
pub fn program_of(command_line: &str) -> Option<&str> {
    command_line.split_whitespace().next()
}

/// Resolve the program of a whole command line (`"bash --login -c"` → bash).
///
/// Returns `None` for blank command lines.
pub fn which_command_line(command_line: &str) -> Option<PathBuf> {
    program_of(command_line).and_then(which)
}

/// Return `true` when the program of `command_line` can be resolved.
pub fn command_exists(command_line: &str) -> bool {
    which_command_line(command_line).is_some()
}

fn has_path(candidate: &Path) -> bool {
    candidate.components().count() > 1
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn resolve_in_dir(dir: &Path, command: &str) -> Option<PathBuf> {
    let direct = dir.join(command);
    if is_executable(&direct) {
        return Some(direct);
    }

    if !cfg!(windows) {
        return None;
    }

    [".exe", ".cmd", ".bat", ".com"]
        .into_iter()
        .map(|ext| dir.join(format!("{command}{ext}")))
        .find(|candidate| is_executable(candidate))
}
