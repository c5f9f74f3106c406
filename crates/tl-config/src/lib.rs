// SPDX-License-Identifier: MIT OR Apache-2.0
//! Launch preference loading, validation, and merging.
//!
//! This crate provides [`LaunchPreferences`], the settings a launch is
//! resolved from (terminal and starter commands, wait policy, diagnostics
//! flag, environment overlay), together with helpers for loading them from
//! TOML files, applying `TL_*` environment overrides, merging overlays, and
//! producing advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tl_command::{DEFAULT_STARTER_COMMAND, Platform, WaitPolicy};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during preference loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested preferences file was not found or could not be read.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent a launch but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The terminal emulator program could not be found on `PATH`.
    TerminalNotFound {
        /// Program that was looked up.
        program: String,
    },
    /// The starter shell program could not be found on `PATH`.
    StarterNotFound {
        /// Program that was looked up.
        program: String,
    },
    /// A recommended optional field is blank.
    MissingOptionalField {
        /// Name of the field.
        field: String,
        /// Why it matters.
        hint: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::TerminalNotFound { program } => {
                write!(f, "terminal emulator '{program}' not found on PATH")
            }
            ConfigWarning::StarterNotFound { program } => {
                write!(f, "starter '{program}' not found on PATH")
            }
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Preference types
// ---------------------------------------------------------------------------

/// Settings a terminal launch is resolved from.
///
/// Unset fields fall back to platform defaults through the accessor
/// methods; an explicitly empty `terminal_command` means "run the starter
/// directly, without opening a terminal window".
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct LaunchPreferences {
    /// Command that opens a new terminal window (e.g. `"x-terminal-emulator -e"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_command: Option<String>,

    /// Shell invocation run inside the terminal (e.g. `"bash --login -c"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_command: Option<String>,

    /// Pause after every run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_always: Option<bool>,

    /// Pause only when the script exits with a non-zero code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_on_errors: Option<bool>,

    /// Print the synthesized command and exit codes to the diagnostics console.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_meta_info: Option<bool>,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Variables overlaid on the inherited environment of the launched process.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl Default for LaunchPreferences {
    fn default() -> Self {
        Self {
            terminal_command: None,
            starter_command: None,
            waiting_always: None,
            waiting_on_errors: None,
            show_meta_info: None,
            log_level: Some("info".into()),
            environment: BTreeMap::new(),
        }
    }
}

impl LaunchPreferences {
    /// Terminal command, falling back to the current platform's default.
    pub fn terminal_command(&self) -> &str {
        self.terminal_command
            .as_deref()
            .unwrap_or_else(|| Platform::current().default_terminal_command())
    }

    /// Starter command, falling back to [`DEFAULT_STARTER_COMMAND`].
    pub fn starter_command(&self) -> &str {
        self.starter_command
            .as_deref()
            .unwrap_or(DEFAULT_STARTER_COMMAND)
    }

    /// Whether to pause after every run (default `false`).
    pub fn waiting_always(&self) -> bool {
        self.waiting_always.unwrap_or(false)
    }

    /// Whether to pause after failing runs (default `true`).
    pub fn waiting_on_errors(&self) -> bool {
        self.waiting_on_errors.unwrap_or(true)
    }

    /// Whether diagnostic meta info is printed (default `false`).
    pub fn show_meta_info(&self) -> bool {
        self.show_meta_info.unwrap_or(false)
    }

    /// Wait policy assembled from the two wait flags.
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(self.waiting_always(), self.waiting_on_errors())
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load [`LaunchPreferences`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`LaunchPreferences::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_preferences(path: Option<&Path>) -> Result<LaunchPreferences, ConfigError> {
    let mut prefs = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => LaunchPreferences::default(),
    };
    apply_env_overrides(&mut prefs);
    Ok(prefs)
}

/// Parse a TOML string into [`LaunchPreferences`].
pub fn parse_toml(content: &str) -> Result<LaunchPreferences, ConfigError> {
    toml::from_str::<LaunchPreferences>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

/// JSON schema describing the preferences file.
pub fn preferences_schema() -> schemars::Schema {
    schemars::schema_for!(LaunchPreferences)
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `TL_TERMINAL_COMMAND`
/// - `TL_STARTER_COMMAND`
/// - `TL_WAIT_ALWAYS`
/// - `TL_WAIT_ON_ERRORS`
/// - `TL_SHOW_META_INFO`
/// - `TL_LOG_LEVEL`
///
/// Boolean variables accept `1/true/yes/on` and `0/false/no/off`; other
/// values are ignored.
pub fn apply_env_overrides(prefs: &mut LaunchPreferences) {
    if let Ok(val) = std::env::var("TL_TERMINAL_COMMAND") {
        prefs.terminal_command = Some(val);
    }
    if let Ok(val) = std::env::var("TL_STARTER_COMMAND") {
        prefs.starter_command = Some(val);
    }
    if let Some(val) = env_flag("TL_WAIT_ALWAYS") {
        prefs.waiting_always = Some(val);
    }
    if let Some(val) = env_flag("TL_WAIT_ON_ERRORS") {
        prefs.waiting_on_errors = Some(val);
    }
    if let Some(val) = env_flag("TL_SHOW_META_INFO") {
        prefs.show_meta_info = Some(val);
    }
    if let Ok(val) = std::env::var("TL_LOG_LEVEL") {
        prefs.log_level = Some(val);
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| parse_flag(&v))
}

/// Parse a boolean flag value the way `TL_*` variables are interpreted.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate preferences, returning advisory warnings.
///
/// Hard errors (unknown log level, malformed environment keys) are returned
/// as a [`ConfigError::ValidationError`]; programs missing from `PATH` and a
/// blank terminal come back as warnings.
pub fn validate_preferences(prefs: &LaunchPreferences) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = prefs.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    for key in prefs.environment.keys() {
        if key.is_empty() {
            errors.push("environment key must not be empty".into());
        } else if key.contains('=') || key.contains('\0') {
            errors.push(format!("environment key '{key}' contains '=' or NUL"));
        }
    }

    let terminal = prefs.terminal_command();
    match tl_which::program_of(terminal) {
        None => warnings.push(ConfigWarning::MissingOptionalField {
            field: "terminal_command".into(),
            hint: "scripts run directly without opening a terminal window".into(),
        }),
        Some(program) if !tl_which::command_exists(terminal) => {
            warnings.push(ConfigWarning::TerminalNotFound {
                program: program.to_string(),
            });
        }
        Some(_) => {}
    }

    let starter = match prefs.starter_command().trim() {
        "" => DEFAULT_STARTER_COMMAND,
        s => s,
    };
    if let Some(program) = tl_which::program_of(starter)
        && !tl_which::command_exists(starter)
    {
        warnings.push(ConfigWarning::StarterNotFound {
            program: program.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two preference sets.  Values in `overlay` take precedence over `base`.
///
/// Environment maps are combined; on key collisions the overlay entry wins.
pub fn merge_preferences(base: LaunchPreferences, overlay: LaunchPreferences) -> LaunchPreferences {
    let mut environment = base.environment;
    environment.extend(overlay.environment);
    LaunchPreferences {
        terminal_command: overlay.terminal_command.or(base.terminal_command),
        starter_command: overlay.starter_command.or(base.starter_command),
        waiting_always: overlay.waiting_always.or(base.waiting_always),
        waiting_on_errors: overlay.waiting_on_errors.or(base.waiting_on_errors),
        show_meta_info: overlay.show_meta_info.or(base.show_meta_info),
        log_level: overlay.log_level.or(base.log_level),
        environment,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
