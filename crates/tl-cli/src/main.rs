// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tl_command::command_string;
use tl_config::{ConfigWarning, LaunchPreferences};
use tl_launch::{LaunchOutcome, LaunchRequest, ProcessLauncher, TracingSink};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tl", version, about = "Launch scripts in an external terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch a script in a new terminal window.
    Launch {
        /// Script to run.
        file: PathBuf,

        #[command(flatten)]
        synthesis: SynthesisArgs,

        /// Environment variables for the script as KEY=VALUE. Can be repeated.
        #[arg(long = "env")]
        env_vars: Vec<String>,

        /// Print the synthesized command and the exit code.
        #[arg(long)]
        show_meta_info: bool,

        /// Block until the script exits and exit with its code.
        #[arg(long)]
        wait: bool,
    },

    /// Print the command that `launch` would run.
    Command {
        /// Script to run.
        file: PathBuf,

        #[command(flatten)]
        synthesis: SynthesisArgs,

        /// Print a JSON array instead of a command line.
        #[arg(long)]
        json: bool,
    },

    /// Print the JSON schema of the preferences file.
    Schema,
}

#[derive(Args, Debug)]
struct SynthesisArgs {
    /// Parameters appended to the script invocation.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    params: String,

    /// Command that opens a terminal window. An empty value runs the starter directly.
    #[arg(long)]
    terminal: Option<String>,

    /// Shell invocation inside the terminal (default: `bash --login -c`).
    #[arg(long)]
    starter: Option<String>,

    /// Pause after every run (`--wait-always=false` turns it off).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    wait_always: Option<bool>,

    /// Pause when the script exits with a non-zero code (`--wait-on-errors=false` turns it off).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    wait_on_errors: Option<bool>,

    /// Preferences file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
}

impl SynthesisArgs {
    /// Preferences set on the command line; unset flags leave the file's values alone.
    fn overlay(&self) -> LaunchPreferences {
        LaunchPreferences {
            terminal_command: self.terminal.clone(),
            starter_command: self.starter.clone(),
            waiting_always: self.wait_always,
            waiting_on_errors: self.wait_on_errors,
            show_meta_info: None,
            log_level: None,
            environment: BTreeMap::new(),
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Launch {
            file,
            synthesis,
            env_vars,
            show_meta_info,
            wait,
        } => {
            let mut overlay = synthesis.overlay();
            overlay.show_meta_info = show_meta_info.then_some(true);
            for raw in env_vars {
                let (key, value) = parse_key_value_flag(&raw, "--env")?;
                overlay.environment.insert(key, value);
            }
            let (prefs, warnings) =
                commands::resolve_preferences(synthesis.config.as_deref(), overlay)?;
            init_tracing(cli.debug, &prefs, &warnings);
            cmd_launch(file, synthesis.params, &prefs, wait)
        }
        Commands::Command {
            file,
            synthesis,
            json,
        } => {
            let (prefs, warnings) =
                commands::resolve_preferences(synthesis.config.as_deref(), synthesis.overlay())?;
            init_tracing(cli.debug, &prefs, &warnings);
            let argv = commands::synthesize_command(&file, &synthesis.params, &prefs);
            if json {
                println!("{}", serde_json::to_string(&argv).context("serialize command")?);
            } else {
                println!("{}", command_string(&argv));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Schema => {
            println!("{}", commands::schema_json()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(debug: bool, prefs: &LaunchPreferences, warnings: &[ConfigWarning]) {
    let filter = EnvFilter::new(commands::filter_directive(debug, prefs));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    for w in warnings {
        warn!(target: "tl.config", "{w}");
    }
}

fn cmd_launch(
    file: PathBuf,
    params: String,
    prefs: &LaunchPreferences,
    wait: bool,
) -> Result<ExitCode> {
    let launcher = ProcessLauncher::from_preferences(Arc::new(TracingSink), prefs);
    let request = LaunchRequest::from_preferences(Some(file.clone()), params, prefs);
    debug!(target: "tl.launch", file = %file.display(), "launch requested");

    match launcher.launch(request) {
        LaunchOutcome::Started(process) => {
            println!("started pid {}", process.id());
            if !wait {
                return Ok(ExitCode::SUCCESS);
            }
            let exit = process
                .wait_for_exit()
                .with_context(|| format!("wait for {}", file.display()))?;
            let code = exit.code.and_then(|c| u8::try_from(c).ok()).unwrap_or(1);
            Ok(ExitCode::from(code))
        }
        LaunchOutcome::NoOp => {
            println!("nothing to launch");
            Ok(ExitCode::SUCCESS)
        }
        LaunchOutcome::Failed(err) => {
            Err(anyhow::Error::new(err)).with_context(|| format!("launch {}", file.display()))
        }
    }
}

fn parse_key_value_flag(raw: &str, flag_name: &str) -> Result<(String, String)> {
    let (raw_key, raw_value) = raw
        .split_once('=')
        .with_context(|| format!("{flag_name} expects KEY=VALUE, got '{raw}'"))?;

    let key = raw_key.trim();
    if key.is_empty() {
        anyhow::bail!("{flag_name} key cannot be empty (got '{raw}')");
    }

    Ok((key.to_string(), raw_value.to_string()))
}
