// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wrapper snippet executed by the starter shell inside the terminal.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prompt shown after every run when [`WaitPolicy::always`] is set.
pub const PRESS_ENTER_PROMPT: &str = "Press enter to continue";

/// Shell variable holding the wrapped script's exit status.
pub const EXIT_STATUS_VAR: &str = "_exit_status";

/// Whether the terminal pauses for user acknowledgment after the script exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Pause after every run.
    pub always: bool,
    /// Pause only when the script exits with a non-zero code.
    pub on_errors: bool,
}

impl WaitPolicy {
    /// Policy that never pauses.
    pub const NEVER: Self = Self {
        always: false,
        on_errors: false,
    };

    /// Create a policy from the two preference flags.
    pub fn new(always: bool, on_errors: bool) -> Self {
        Self { always, on_errors }
    }

    /// Returns `true` if any prompt will be emitted.
    pub fn pauses(&self) -> bool {
        self.always || self.on_errors
    }
}

/// Build the wrapper snippet for `file` with `params`.
///
/// The snippet changes into the script's directory, runs it, captures and
/// echoes the exit status, emits the prompts selected by `wait`, and exits
/// with the captured status.
pub fn script_snippet(file: &Path, params: &str, wait: WaitPolicy) -> String {
    let mut out = String::new();

    if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
        out.push_str("cd ");
        out.push_str(&double_quote(&dir.to_string_lossy()));
        out.push(';');
    }

    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string_lossy().into_owned());
    out.push_str(&double_quote(&format!("./{name}")));
    let params = params.trim();
    if !params.is_empty() {
        out.push(' ');
        out.push_str(params);
    }
    out.push(';');

    out.push_str(&format!("{EXIT_STATUS_VAR}=$?;"));
    out.push_str(&format!("echo \"Exit code=${EXIT_STATUS_VAR}\";"));

    if wait.on_errors {
        out.push_str(&format!(
            "if [ ${EXIT_STATUS_VAR} -ne 0 ]; then read -p \"Unexpected exit code:${EXIT_STATUS_VAR} , press enter to continue\";fi;"
        ));
    }
    if wait.always {
        out.push_str(&format!("read -p \"{PRESS_ENTER_PROMPT}\";"));
    }

    out.push_str(&format!("exit ${EXIT_STATUS_VAR}"));
    out
}

/// Quote `s` for a POSIX shell double-quoted context.
pub(crate) fn double_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_without_wait_flags_has_no_prompt() {
        let s = script_snippet(Path::new("/tmp/script.sh"), "", WaitPolicy::NEVER);
        assert_eq!(
            s,
            "cd \"/tmp\";\"./script.sh\";_exit_status=$?;echo \"Exit code=$_exit_status\";exit $_exit_status"
        );
    }

    #[test]
    fn params_are_appended_after_the_script() {
        let s = script_snippet(Path::new("/tmp/script.sh"), "-a 1 -b 2", WaitPolicy::NEVER);
        assert!(s.contains("\"./script.sh\" -a 1 -b 2;"));
    }

    #[test]
    fn blank_params_leave_no_trailing_space() {
        let s = script_snippet(Path::new("/tmp/script.sh"), "   ", WaitPolicy::NEVER);
        assert!(s.contains("\"./script.sh\";"));
    }

    #[test]
    fn bare_file_name_skips_cd() {
        let s = script_snippet(Path::new("script.sh"), "", WaitPolicy::NEVER);
        assert!(s.starts_with("\"./script.sh\";"));
    }

    #[test]
    fn error_prompt_precedes_always_prompt() {
        let s = script_snippet(Path::new("/tmp/a.sh"), "", WaitPolicy::new(true, true));
        let err = s.find("Unexpected exit code").unwrap();
        let always = s.find("read -p \"Press enter to continue\"").unwrap();
        assert!(err < always);
        assert!(s.ends_with("exit $_exit_status"));
    }

    #[test]
    fn directory_is_escaped() {
        let s = script_snippet(Path::new("/tmp/my \"dir\"/$x/a.sh"), "", WaitPolicy::NEVER);
        assert!(s.starts_with("cd \"/tmp/my \\\"dir\\\"/\\$x\";"));
    }

    #[test]
    fn file_name_is_quoted_as_one_word() {
        let s = script_snippet(Path::new("/tmp/my script.sh"), "", WaitPolicy::NEVER);
        assert!(s.contains(";\"./my script.sh\";"));

        let s = script_snippet(Path::new("/tmp/a;echo $HOME;b.sh"), "-x", WaitPolicy::NEVER);
        assert!(s.contains(";\"./a;echo \\$HOME;b.sh\" -x;"));
    }

    #[test]
    fn policy_pauses() {
        assert!(!WaitPolicy::NEVER.pauses());
        assert!(WaitPolicy::new(false, true).pauses());
        assert!(WaitPolicy::new(true, false).pauses());
    }
}
