//! Command-handling boundary of the shell.
//!
//! [`Shell::handle_line`] classifies one input line and either runs it as an
//! external pipeline or applies a scheduling builtin to the shared
//! [`TaskStore`]. Every failure comes back as a [`ShellError`] for the caller
//! to print; none of them end the session.

pub mod command;

use std::fmt::Write as _;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::{OutputFormat, ShellConfig};
use crate::error::{Result, ShellError};
use crate::persistence;
use crate::pipeline::{Launch, Pipeline};
use crate::scheduler::{PassReport, Priority, Scheduler, TaskStore};
use crate::worker::{InterpreterEngine, ScriptEngine, TaskRunner};

pub use command::{tokenize, ShellCommand, HELP_TEXT};

/// What the caller should do after a line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print this text.
    Text(String),
    /// Nothing to print.
    Silent,
    /// End the session.
    Exit,
}

pub struct Shell {
    store: Arc<RwLock<TaskStore>>,
    scheduler: Scheduler,
    output: OutputFormat,
}

impl Shell {
    /// Shell that runs scheduled scripts with the configured interpreter.
    pub fn new(config: ShellConfig) -> Self {
        let engine = Arc::new(InterpreterEngine::new(config.interpreter.clone()));
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: ShellConfig, engine: Arc<dyn ScriptEngine>) -> Self {
        Self {
            store: Arc::new(RwLock::new(TaskStore::new())),
            scheduler: Scheduler::new(TaskRunner::new(engine), config.scheduler),
            output: config.output,
        }
    }

    /// Shared handle to the task queues.
    pub fn store(&self) -> Arc<RwLock<TaskStore>> {
        self.store.clone()
    }

    pub async fn handle_line(&self, line: &str) -> Result<Reply> {
        match ShellCommand::parse(&tokenize(line))? {
            Some(cmd) => self.dispatch(cmd).await,
            None => Ok(Reply::Silent),
        }
    }

    pub async fn dispatch(&self, cmd: ShellCommand) -> Result<Reply> {
        match cmd {
            ShellCommand::Schedule { path, priority } => {
                // Only readable scripts are accepted; the path is queued, not the content
                tokio::fs::File::open(&path)
                    .await
                    .map_err(|e| ShellError::io(&path, e))?;
                let id = self.store.write().await.add_task(path.as_str(), priority)?;
                Ok(Reply::Text(format!(
                    "[Script file {} scheduled as a single task] (id {}, {} priority)",
                    path, id, priority
                )))
            }
            ShellCommand::Execute => {
                let report = self.scheduler.run_all(&self.store).await;
                Ok(Reply::Text(render_report(&report)))
            }
            ShellCommand::View => {
                let store = self.store.read().await;
                let text = match self.output {
                    OutputFormat::Table => render_table(&store),
                    OutputFormat::Json => serde_json::to_string_pretty(&store.snapshot())?,
                };
                Ok(Reply::Text(text))
            }
            ShellCommand::Save { path } => {
                let count = persistence::save(&*self.store.read().await, &path).await?;
                Ok(Reply::Text(format!(
                    "Saved {} task(s) to {}",
                    count,
                    path.display()
                )))
            }
            ShellCommand::Load { path } => {
                let tasks = persistence::load(&path).await?;
                let total = tasks.len();
                let restored = self.store.write().await.restore(tasks);
                let mut text = format!("Loaded {} task(s) from {}", restored, path.display());
                if restored < total {
                    let _ = write!(text, " ({} skipped: id already used)", total - restored);
                }
                Ok(Reply::Text(text))
            }
            ShellCommand::Cancel { id } => {
                if self.store.write().await.cancel_task(id) {
                    Ok(Reply::Text(format!("Task {} cancelled.", id)))
                } else {
                    Err(ShellError::NotFound(id))
                }
            }
            ShellCommand::Modify { id, command } => {
                if self.store.write().await.modify_task(id, command)? {
                    Ok(Reply::Text(format!("Task {} modified.", id)))
                } else {
                    Err(ShellError::NotFound(id))
                }
            }
            ShellCommand::Help => Ok(Reply::Text(HELP_TEXT.to_string())),
            ShellCommand::Exit => Ok(Reply::Exit),
            ShellCommand::External { tokens, background } => {
                let pipeline = Pipeline::parse(&tokens, background)?;
                match pipeline.execute().await? {
                    Launch::Finished(0) => Ok(Reply::Silent),
                    Launch::Finished(code) => {
                        Ok(Reply::Text(format!("Command exited with code: {}", code)))
                    }
                    Launch::Background(Some(pid)) => Ok(Reply::Text(format!("[bg] {}", pid))),
                    Launch::Background(None) => Ok(Reply::Silent),
                }
            }
        }
    }
}

fn render_table(store: &TaskStore) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Scheduled Tasks (RR - High Priority):");
    for task in store.tasks(Priority::High) {
        let _ = writeln!(out, "[{}] {}", task.id, task.command);
    }
    let _ = writeln!(out);
    let _ = write!(out, "Scheduled Tasks (FCFS - Low Priority):");
    for task in store.tasks(Priority::Low) {
        let _ = write!(out, "\n[{}] {}", task.id, task.command);
    }
    out
}

fn render_report(report: &PassReport) -> String {
    let mut out = String::from("== Multi-Level Queue Scheduler ==");
    let sections = [
        ("== Round Robin Queue (High Priority) ==", &report.high),
        ("== FCFS Queue (Low Priority) ==", &report.low),
    ];
    for (title, results) in sections {
        let _ = write!(out, "\n{}", title);
        for r in results.iter() {
            let _ = write!(out, "\n[{}] {}: {}", r.task_id, r.command, r.status);
            if let Some(err) = &r.error {
                let _ = write!(out, " ({})", err);
            }
        }
    }
    let _ = write!(
        out,
        "\n{} task(s) run, {} failed",
        report.total(),
        report.failed()
    );
    out
}
