use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::InterpreterConfig;
use crate::error::{Result, ShellError};

/// Runs a script file and reports its exit code.
///
/// `0` means success; anything else is a failure the caller reports but
/// never retries.
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    async fn run_script(&self, path: &Path) -> Result<i32>;
}

/// Runs scripts by handing the path to an external interpreter program.
///
/// The child inherits the shell's stdio, so script output goes straight to
/// the terminal.
#[derive(Debug, Clone)]
pub struct InterpreterEngine {
    config: InterpreterConfig,
}

impl InterpreterEngine {
    pub fn new(config: InterpreterConfig) -> Self {
        Self { config }
    }
}

impl Default for InterpreterEngine {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

#[async_trait]
impl ScriptEngine for InterpreterEngine {
    async fn run_script(&self, path: &Path) -> Result<i32> {
        let status = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(path)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| ShellError::spawn(&self.config.program, e))?;

        Ok(exit_code(status))
    }
}

/// Exit code of a finished child. A child killed by a signal reports the
/// conventional `128 + signal`.
pub(crate) fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|s| 128 + s))
        .unwrap_or(-1)
}
