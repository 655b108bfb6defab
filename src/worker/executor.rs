use std::path::Path;
use std::sync::Arc;

use crate::error::ShellError;
use crate::scheduler::{Task, TaskId, TaskStatus};
use crate::worker::script::ScriptEngine;

/// Result of task execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub task_id: TaskId,
    pub command: String,
    pub status: TaskStatus,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub(crate) fn failed(task: &Task, exit_code: Option<i32>, error: String) -> Self {
        Self {
            task_id: task.id,
            command: task.command.clone(),
            status: TaskStatus::Failed,
            exit_code,
            error: Some(error),
        }
    }
}

/// Executes a single scheduled task through the script engine.
///
/// Failures are folded into the returned [`ExecutionResult`]; running a task
/// never returns an error, so one bad task cannot abort a scheduling pass.
#[derive(Clone)]
pub struct TaskRunner {
    engine: Arc<dyn ScriptEngine>,
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner").finish_non_exhaustive()
    }
}

impl TaskRunner {
    pub fn new(engine: Arc<dyn ScriptEngine>) -> Self {
        Self { engine }
    }

    /// Run the script named by `task.command`
    pub async fn run(&self, task: &Task) -> ExecutionResult {
        if task.command.trim().is_empty() {
            tracing::error!(task_id = task.id, "[Scheduler] Error: empty filename in task command");
            return ExecutionResult::failed(task, None, ShellError::InvalidTask.to_string());
        }

        tracing::info!(task_id = task.id, command = %task.command, "[Scheduler] Executing script");

        match self.engine.run_script(Path::new(&task.command)).await {
            Ok(0) => {
                tracing::info!(task_id = task.id, "Task completed");
                ExecutionResult {
                    task_id: task.id,
                    command: task.command.clone(),
                    status: TaskStatus::Completed,
                    exit_code: Some(0),
                    error: None,
                }
            }
            Ok(code) => {
                tracing::warn!(
                    task_id = task.id,
                    command = %task.command,
                    exit_code = code,
                    "[Scheduler] Error: script execution failed"
                );
                ExecutionResult::failed(task, Some(code), format!("Exit code: {}", code))
            }
            Err(e) => {
                tracing::error!(task_id = task.id, error = %e, "[Scheduler] Error: script did not start");
                ExecutionResult::failed(task, None, e.to_string())
            }
        }
    }
}
