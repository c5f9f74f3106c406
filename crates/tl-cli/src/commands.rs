// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared command implementations for the `tl` CLI.
//!
//! These functions are kept apart from argument parsing so they can be
//! tested without spawning the binary.

use anyhow::{Context, Result};
use std::path::Path;
use tl_command::{CommandSynthesizer, SynthesisInput};
use tl_config::{ConfigWarning, LaunchPreferences, load_preferences, merge_preferences};

/// Load preferences from `config` (plus `TL_*` overrides) and lay the
/// command-line `overlay` on top.
///
/// Hard validation failures are errors; advisory warnings are returned for
/// the caller to report once logging is up.
pub fn resolve_preferences(
    config: Option<&Path>,
    overlay: LaunchPreferences,
) -> Result<(LaunchPreferences, Vec<ConfigWarning>)> {
    let base = load_preferences(config).with_context(|| match config {
        Some(p) => format!("load preferences from {}", p.display()),
        None => "load preferences".to_string(),
    })?;
    let prefs = merge_preferences(base, overlay);
    let warnings = tl_config::validate_preferences(&prefs).context("validate preferences")?;
    Ok((prefs, warnings))
}

/// Synthesize the argument vector for `file` without touching the
/// filesystem.
pub fn synthesize_command(file: &Path, params: &str, prefs: &LaunchPreferences) -> Vec<String> {
    CommandSynthesizer::for_current_platform().synthesize(&SynthesisInput {
        terminal_command: prefs.terminal_command(),
        starter_command: prefs.starter_command(),
        file,
        params,
        wait: prefs.wait_policy(),
    })
}

/// Return the pretty-printed JSON schema of the preferences file.
pub fn schema_json() -> Result<String> {
    let value = serde_json::to_value(tl_config::preferences_schema())?;
    serde_json::to_string_pretty(&value).context("serialize schema")
}

/// Tracing filter directive for the CLI.
///
/// `--debug` wins; otherwise the preferences' `log_level` applies.
pub fn filter_directive(debug: bool, prefs: &LaunchPreferences) -> String {
    if debug {
        return "tl=debug".to_string();
    }
    let level = prefs.log_level.as_deref().unwrap_or("info");
    format!("tl={level}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn schema_mentions_every_preference() {
        let json = schema_json().unwrap();
        for field in ["terminal_command", "starter_command", "waiting_on_errors"] {
            assert!(json.contains(field), "schema lacks {field}");
        }
    }

    #[test]
    fn filter_prefers_debug_flag() {
        let prefs = LaunchPreferences {
            log_level: Some("warn".into()),
            ..Default::default()
        };
        assert_eq!(filter_directive(true, &prefs), "tl=debug");
        assert_eq!(filter_directive(false, &prefs), "tl=warn");
        let unset = LaunchPreferences {
            log_level: None,
            ..Default::default()
        };
        assert_eq!(filter_directive(false, &unset), "tl=info");
    }

    #[test]
    fn direct_invocation_synthesis() {
        let prefs = LaunchPreferences {
            terminal_command: Some(String::new()),
            starter_command: Some("sh -c".into()),
            waiting_on_errors: Some(false),
            ..Default::default()
        };
        let argv = synthesize_command(Path::new("/tmp/run.sh"), "", &prefs);
        assert_eq!(&argv[..2], ["sh", "-c"]);
        assert_eq!(argv.len(), 3);
        assert!(argv[2].contains("./run.sh"));
    }

    #[test]
    fn overlay_wins_over_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "starter_command = \"zsh -c\"\nwaiting_always = false").unwrap();
        let overlay = LaunchPreferences {
            waiting_always: Some(true),
            log_level: None,
            ..Default::default()
        };
        let (prefs, _) = resolve_preferences(Some(f.path()), overlay).unwrap();
        assert!(prefs.waiting_always());
        assert_eq!(prefs.starter_command(), "zsh -c");
    }

    #[test]
    fn invalid_log_level_is_an_error() {
        let overlay = LaunchPreferences {
            log_level: Some("loud".into()),
            ..Default::default()
        };
        let err = resolve_preferences(None, overlay).unwrap_err();
        assert!(format!("{err:#}").contains("invalid log_level"));
    }
}
