use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use jamsh::config::{OutputFormat, ShellConfig};
use jamsh::scheduler::Priority;
use jamsh::worker::ScriptEngine;
use jamsh::{Reply, Result, Shell, ShellError};

/// Script engine that succeeds unless the script name contains "fail".
#[derive(Default)]
struct FakeEngine {
    ran: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl ScriptEngine for FakeEngine {
    async fn run_script(&self, path: &Path) -> Result<i32> {
        self.ran.lock().unwrap().push(path.to_path_buf());
        Ok(if path.display().to_string().contains("fail") {
            1
        } else {
            0
        })
    }
}

fn shell_with(config: ShellConfig) -> (Shell, Arc<FakeEngine>) {
    let engine = Arc::new(FakeEngine::default());
    (Shell::with_engine(config, engine.clone()), engine)
}

fn script(dir: &TempDir, name: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, "exit 0\n").unwrap();
    path.display().to_string()
}

fn text(reply: Reply) -> String {
    match reply {
        Reply::Text(text) => text,
        other => panic!("expected text reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_blank_line_is_silent() {
    let (shell, _) = shell_with(ShellConfig::default());
    assert_eq!(shell.handle_line("   ").await.unwrap(), Reply::Silent);
    assert_eq!(shell.handle_line("").await.unwrap(), Reply::Silent);
}

#[tokio::test]
async fn test_exit_and_help() {
    let (shell, _) = shell_with(ShellConfig::default());
    assert_eq!(shell.handle_line("exit").await.unwrap(), Reply::Exit);
    let help = text(shell.handle_line("help").await.unwrap());
    assert!(help.contains("jschedule"));
}

#[tokio::test]
async fn test_schedule_defaults_to_low_priority() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = shell_with(ShellConfig::default());
    let a = script(&dir, "a.script");

    let reply = text(shell.handle_line(&format!("jschedule {a}")).await.unwrap());
    assert!(reply.starts_with(&format!("[Script file {a} scheduled as a single task]")));

    let store = shell.store();
    let store = store.read().await;
    assert_eq!(store.get_task(1).unwrap().priority, Priority::Low);
}

#[tokio::test]
async fn test_schedule_missing_file() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = shell_with(ShellConfig::default());
    let missing = dir.path().join("missing.script");

    let err = shell
        .handle_line(&format!("jschedule {}", missing.display()))
        .await
        .unwrap_err();
    assert!(matches!(err, ShellError::Io { .. }));
    assert!(shell.store().read().await.is_empty());
}

#[tokio::test]
async fn test_schedule_bad_priority_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = shell_with(ShellConfig::default());
    let a = script(&dir, "a.script");

    let err = shell
        .handle_line(&format!("jschedule {a} urgent"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShellError::Usage(_)));
}

#[tokio::test]
async fn test_view_lists_both_queues() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = shell_with(ShellConfig::default());
    let a = script(&dir, "a.script");
    let b = script(&dir, "b.script");
    shell.handle_line(&format!("jschedule {a} 1")).await.unwrap();
    shell.handle_line(&format!("jschedule {b} 2")).await.unwrap();

    let view = text(shell.handle_line("jscheduleview").await.unwrap());
    assert_eq!(
        view,
        format!(
            "Scheduled Tasks (RR - High Priority):\n[1] {a}\n\n\
             Scheduled Tasks (FCFS - Low Priority):\n[2] {b}"
        )
    );
}

#[tokio::test]
async fn test_view_as_json() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = shell_with(ShellConfig::default().with_output(OutputFormat::Json));
    let a = script(&dir, "a.script");
    shell.handle_line(&format!("jschedule {a} 1")).await.unwrap();

    let view = text(shell.handle_line("jscheduleview").await.unwrap());
    let parsed: serde_json::Value = serde_json::from_str(&view).unwrap();
    assert_eq!(parsed[0]["id"], 1);
    assert_eq!(parsed[0]["command"], a);
}

#[tokio::test]
async fn test_cancel_and_modify() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = shell_with(ShellConfig::default());
    let a = script(&dir, "a.script");
    shell.handle_line(&format!("jschedule {a}")).await.unwrap();

    let reply = text(shell.handle_line("jschedulemodify 1 other.script").await.unwrap());
    assert_eq!(reply, "Task 1 modified.");
    assert_eq!(
        shell.store().read().await.get_task(1).unwrap().command,
        "other.script"
    );

    let reply = text(shell.handle_line("jschedulecancel 1").await.unwrap());
    assert_eq!(reply, "Task 1 cancelled.");

    let err = shell.handle_line("jschedulecancel 1").await.unwrap_err();
    assert!(matches!(err, ShellError::NotFound(1)));
    assert_eq!(err.to_string(), "Task 1 not found");

    let err = shell.handle_line("jschedulemodify 7 x.script").await.unwrap_err();
    assert!(matches!(err, ShellError::NotFound(7)));
}

#[tokio::test]
async fn test_cancel_requires_numeric_id() {
    let (shell, _) = shell_with(ShellConfig::default());
    let err = shell.handle_line("jschedulecancel abc").await.unwrap_err();
    assert!(matches!(err, ShellError::Usage(_)));
}

#[tokio::test]
async fn test_execute_runs_and_empties_queues() {
    let dir = TempDir::new().unwrap();
    let (shell, engine) = shell_with(ShellConfig::default());
    let ok = script(&dir, "ok.script");
    let fail = script(&dir, "fail.script");
    shell.handle_line(&format!("jschedule {ok} 1")).await.unwrap();
    shell.handle_line(&format!("jschedule {fail} 2")).await.unwrap();

    let report = text(shell.handle_line("jschedulexecute").await.unwrap());

    assert!(report.starts_with("== Multi-Level Queue Scheduler =="));
    assert!(report.contains(&format!("[1] {ok}: completed")));
    assert!(report.contains(&format!("[2] {fail}: failed")));
    assert!(report.ends_with("2 task(s) run, 1 failed"));
    assert_eq!(engine.ran.lock().unwrap().len(), 2);
    assert!(shell.store().read().await.is_empty());
}

#[tokio::test]
async fn test_save_and_load_through_shell() {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("tasks.txt");
    let a = script(&dir, "a.script");
    let b = script(&dir, "b.script");

    let (first, _) = shell_with(ShellConfig::default());
    first.handle_line(&format!("jschedule {a} 1")).await.unwrap();
    first.handle_line(&format!("jschedule {b}")).await.unwrap();
    let reply = text(
        first
            .handle_line(&format!("jschedulesave {}", snapshot.display()))
            .await
            .unwrap(),
    );
    assert_eq!(reply, format!("Saved 2 task(s) to {}", snapshot.display()));

    let (second, _) = shell_with(ShellConfig::default());
    let load = format!("jscheduleload {}", snapshot.display());
    let reply = text(second.handle_line(&load).await.unwrap());
    assert_eq!(reply, format!("Loaded 2 task(s) from {}", snapshot.display()));

    // Loading the same snapshot again skips ids already queued
    let reply = text(second.handle_line(&load).await.unwrap());
    assert!(reply.starts_with("Loaded 0 task(s)"));
    assert!(reply.contains("2 skipped"));

    let store = second.store();
    let store = store.read().await;
    assert_eq!(store.get_task(1).unwrap().priority, Priority::High);
    assert_eq!(store.get_task(2).unwrap().priority, Priority::Low);
}

#[tokio::test]
async fn test_external_command_exit_code() {
    let (shell, _) = shell_with(ShellConfig::default());
    assert_eq!(shell.handle_line("true").await.unwrap(), Reply::Silent);
    assert_eq!(
        text(shell.handle_line("false").await.unwrap()),
        "Command exited with code: 1"
    );
}

#[tokio::test]
async fn test_external_background_reports_pid() {
    let (shell, _) = shell_with(ShellConfig::default());
    let reply = text(shell.handle_line("sleep 1 &").await.unwrap());
    assert!(reply.starts_with("[bg] "));
}

#[tokio::test]
async fn test_external_errors_do_not_touch_store() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = shell_with(ShellConfig::default());
    let a = script(&dir, "a.script");
    shell.handle_line(&format!("jschedule {a}")).await.unwrap();

    let err = shell.handle_line("ls | sort | head").await.unwrap_err();
    assert!(matches!(err, ShellError::UnsupportedPipeline(_)));
    let err = shell.handle_line("echo hi >").await.unwrap_err();
    assert!(matches!(err, ShellError::Syntax(_)));

    assert_eq!(shell.store().read().await.len(), 1);
}
