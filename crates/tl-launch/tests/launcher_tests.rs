// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end launcher tests running real child processes.
//!
//! Scripts are started by direct invocation (blank terminal command with an
//! `sh -c` starter) so no terminal emulator is needed.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tl_launch::{
    DiagnosticsSink, LaunchContext, LaunchError, LaunchOutcome, LaunchRequest, LaunchState,
    MemorySink, ProcessLauncher,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn direct_context(file: &Path) -> tl_launch::LaunchContextBuilder {
    LaunchContext::builder()
        .file(file)
        .terminal_command("")
        .starter_command("sh -c")
}

fn launcher(sink: &MemorySink) -> ProcessLauncher {
    let shared: Arc<dyn DiagnosticsSink> = Arc::new(sink.clone());
    ProcessLauncher::new(shared)
}

// ---------------------------------------------------------------------------
// Started processes
// ---------------------------------------------------------------------------

#[test]
fn environment_overlay_reaches_the_script() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "env.sh", "printf '%s' \"$FOO\" > out.txt");
    let ctx = direct_context(&script).env("FOO", "bar").build().unwrap();

    let sink = MemorySink::new();
    let process = launcher(&sink).execute(&ctx).into_process().unwrap();
    let exit = process.wait_for_exit().unwrap();

    assert!(exit.success());
    assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "bar");
    assert!(sink.error_messages().is_empty());
}

#[test]
fn script_runs_in_its_own_directory_with_params() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "args.sh", "echo \"$1-$2\" > args.txt");
    let ctx = direct_context(&script).params("one two").build().unwrap();

    let process = launcher(&MemorySink::new())
        .execute(&ctx)
        .into_process()
        .unwrap();
    process.wait_for_exit().unwrap();

    let written = fs::read_to_string(dir.path().join("args.txt")).unwrap();
    assert_eq!(written.trim(), "one-two");
}

#[test]
fn exit_code_propagates_through_the_snippet() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "fail.sh", "exit 3");
    let ctx = direct_context(&script).build().unwrap();

    let process = launcher(&MemorySink::new())
        .execute(&ctx)
        .into_process()
        .unwrap();
    let exit = process.wait_for_exit().unwrap();

    assert_eq!(exit.code, Some(3));
    assert!(!exit.success());
}

#[test]
fn script_names_with_shell_metacharacters_run_as_one_program() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["my script.sh", "a;touch injected;b.sh"] {
        let script = write_script(dir.path(), name, "exit 7");
        let ctx = direct_context(&script).build().unwrap();

        let process = launcher(&MemorySink::new())
            .execute(&ctx)
            .into_process()
            .unwrap();
        let exit = process.wait_for_exit().unwrap();

        assert_eq!(exit.code, Some(7), "script {name:?}");
    }
    assert!(!dir.path().join("injected").exists());
}

#[test]
fn execute_returns_before_the_process_finishes() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "slow.sh", "sleep 2");
    let ctx = direct_context(&script).build().unwrap();

    let started = Instant::now();
    let launcher = launcher(&MemorySink::new());
    let pending = launcher.spawn(&ctx).unwrap();
    let interrupter = pending.interrupter();
    let process = pending.wait_for_started_process_or_none().unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(interrupter.state(), LaunchState::StartedWithProcess);
    assert!(process.id() > 0);

    process.wait_for_exit().unwrap();
    assert_eq!(interrupter.state(), LaunchState::Exited);
}

#[test]
fn meta_info_prints_command_and_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "ok.sh", "true");
    let ctx = direct_context(&script).build().unwrap();

    let sink = MemorySink::new();
    let process = launcher(&sink)
        .with_meta_info(true)
        .execute(&ctx)
        .into_process()
        .unwrap();
    process.wait_for_exit().unwrap();

    let lines = sink.console_lines();
    assert_eq!(lines[0], ">>> Launch Terminal:");
    assert_eq!(lines[1], format!("    {}", ctx.command_string()));
    assert_eq!(lines[2], "Bash process terminated with exit code:0");
}

#[test]
fn interrupt_after_publication_keeps_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "ok.sh", "true");
    let ctx = direct_context(&script).build().unwrap();

    let pending = launcher(&MemorySink::new()).spawn(&ctx).unwrap();
    let interrupter = pending.interrupter();
    while !interrupter.state().is_started() {
        std::thread::sleep(Duration::from_millis(5));
    }
    interrupter.interrupt();

    let outcome = pending.wait_for_started_process();
    assert!(outcome.is_started());
    assert!(interrupter.is_interrupted());
    outcome.into_process().unwrap().wait_for_exit().unwrap();
}

// ---------------------------------------------------------------------------
// Nothing started
// ---------------------------------------------------------------------------

#[test]
fn empty_commands_are_a_noop_without_exit_log() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "never.sh", "touch ran.txt");
    let ctx = direct_context(&script).commands(Vec::new()).build().unwrap();

    let sink = MemorySink::new();
    let pending = launcher(&sink).with_meta_info(true).spawn(&ctx).unwrap();
    let interrupter = pending.interrupter();
    let outcome = pending.wait_for_started_process();

    assert!(outcome.is_noop());
    assert_eq!(interrupter.state(), LaunchState::StartedNoProcess);
    assert!(sink.lines().is_empty());
    assert!(!dir.path().join("ran.txt").exists());
}

#[test]
fn spawn_failure_is_reported_and_returned() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "ok.sh", "true");
    let ctx = direct_context(&script)
        .starter_command("tl-no-such-starter-binary -c")
        .build()
        .unwrap();

    let sink = MemorySink::new();
    let outcome = launcher(&sink).execute(&ctx);

    match outcome {
        LaunchOutcome::Failed(LaunchError::ProcessStart { program, .. }) => {
            assert_eq!(program, "tl-no-such-starter-binary");
        }
        other => panic!("expected a process start failure, got {other:?}"),
    }
    assert_eq!(sink.error_messages(), ["Cannot start real runtime process"]);
}

#[test]
fn launch_without_file_reports_and_fails() {
    let sink = MemorySink::new();
    let outcome = launcher(&sink).launch(LaunchRequest::default());

    let err = outcome.error().unwrap();
    assert!(err.is_validation());
    assert_eq!(sink.error_messages(), ["File was null"]);
}

#[test]
fn launch_with_missing_file_reports_context_error() {
    let sink = MemorySink::new();
    let outcome = launcher(&sink).launch(LaunchRequest::new("/no/such/dir/run.sh"));

    assert!(outcome.error().unwrap().is_validation());
    assert_eq!(sink.error_messages(), ["Cannot create launch context"]);
}

#[test]
fn launch_request_runs_like_a_context() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "req.sh", "exit 7");
    let request = LaunchRequest {
        starter_command: "sh -c".into(),
        ..LaunchRequest::new(&script)
    };

    let process = launcher(&MemorySink::new())
        .launch(request)
        .into_process()
        .unwrap();
    assert_eq!(process.wait_for_exit().unwrap().code, Some(7));
}

// ---------------------------------------------------------------------------
// Async exit
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn exit_can_be_awaited() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "async.sh", "exit 5");
    let ctx = direct_context(&script).build().unwrap();

    let launcher = launcher(&MemorySink::new());
    let outcome = tokio::task::spawn_blocking(move || launcher.execute(&ctx))
        .await
        .unwrap();
    let exit = tokio::time::timeout(
        Duration::from_secs(10),
        outcome.into_process().unwrap().exited(),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(exit.code, Some(5));
}

#[test]
fn launch_state_serializes_snake_case() {
    let json = serde_json::to_string(&LaunchState::StartedWithProcess).unwrap();
    assert_eq!(json, "\"started_with_process\"");
}
