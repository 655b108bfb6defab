use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};

use crate::error::{Result, ShellError};
use crate::pipeline::plan::{Input, Output, Pipeline, Stage};
use crate::worker::script::exit_code;

/// Permission bits for files created by `>` and `>>`.
const REDIRECT_MODE: u32 = 0o644;

/// How a launched command line ended up running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    /// The caller waited; carries the exit code of the last stage.
    Finished(i32),
    /// Detached; carries the pid of the background process.
    Background(Option<u32>),
}

/// Running processes of a spawned [`Pipeline`].
///
/// Completion is observed on the last stage only. Earlier stages are left to
/// finish on their own once their reader goes away.
#[derive(Debug)]
pub struct PipelineHandle {
    stages: Vec<(String, Child)>,
}

impl PipelineHandle {
    fn last_mut(&mut self) -> &mut (String, Child) {
        // A handle is only built from a non-empty list of children
        let idx = self.stages.len() - 1;
        &mut self.stages[idx]
    }

    /// Pid of the downstream process, if it is still known.
    pub fn id(&self) -> Option<u32> {
        self.stages.last().and_then(|(_, child)| child.id())
    }

    /// Wait for the downstream process to exit.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        let (program, child) = self.last_mut();
        child.wait().await.map_err(|e| ShellError::spawn(program.clone(), e))
    }

    /// Check whether the downstream process has exited without blocking.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        let (program, child) = self.last_mut();
        child.try_wait().map_err(|e| ShellError::spawn(program.clone(), e))
    }

    /// Hand the processes to a background task that reaps them.
    fn detach(self) {
        for (program, mut child) in self.stages {
            let pid = child.id();
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) => {
                        tracing::info!(
                            program = %program,
                            pid = ?pid,
                            exit_code = exit_code(status),
                            "Background process finished"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(program = %program, pid = ?pid, error = %e, "Failed to reap background process");
                    }
                }
            });
        }
    }
}

impl Pipeline {
    /// Launch every stage. Stages start left to right; the upstream stdout is
    /// connected to the downstream stdin through an anonymous pipe.
    ///
    /// Every redirect file is opened before the first process starts, so a
    /// bad path leaves nothing running.
    pub fn spawn(&self) -> Result<PipelineHandle> {
        let mut redirects = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            redirects.push(open_redirects(stage)?);
        }

        let mut stages: Vec<(String, Child)> = Vec::with_capacity(self.stages.len());
        let mut carried: Option<Stdio> = None;

        for (stage, (file_in, file_out)) in self.stages.iter().zip(redirects) {
            let stdin = match (&stage.stdin, file_in) {
                (_, Some(file)) => file,
                (Input::Pipe, None) => carried.take().unwrap_or_else(Stdio::null),
                _ => Stdio::inherit(),
            };
            let stdout = match (&stage.stdout, file_out) {
                (_, Some(file)) => file,
                (Output::Pipe, None) => Stdio::piped(),
                _ => Stdio::inherit(),
            };

            let mut child = match spawn_stage(stage, stdin, stdout) {
                Ok(child) => child,
                Err(e) => return Err(abandon(stages, e)),
            };

            if stage.stdout == Output::Pipe {
                if let Some(out) = child.stdout.take() {
                    match TryInto::<Stdio>::try_into(out) {
                        Ok(stdio) => carried = Some(stdio),
                        Err(e) => {
                            let err = ShellError::spawn(stage.program.clone(), e);
                            stages.push((stage.program.clone(), child));
                            return Err(abandon(stages, err));
                        }
                    }
                }
            }

            tracing::debug!(program = %stage.program, pid = ?child.id(), "Stage started");
            stages.push((stage.program.clone(), child));
        }

        if stages.is_empty() {
            return Err(ShellError::Syntax("empty command line".to_string()));
        }
        Ok(PipelineHandle { stages })
    }

    /// Spawn the pipeline and, unless it runs in the background, wait for it.
    ///
    /// A piped line always waits for its downstream stage, even when started
    /// with `&`.
    pub async fn execute(&self) -> Result<Launch> {
        let mut handle = self.spawn()?;

        if self.background && !self.is_piped() {
            let pid = handle.id();
            tracing::info!(pid = ?pid, "Started background process");
            handle.detach();
            return Ok(Launch::Background(pid));
        }

        let status = handle.wait().await?;
        let code = exit_code(status);
        if code != 0 {
            tracing::debug!(exit_code = code, "Command exited with non-zero status");
        }
        Ok(Launch::Finished(code))
    }
}

/// Kill stages that already started and leave them to be reaped, so an
/// upstream writer is not left with nobody reading.
fn abandon(mut stages: Vec<(String, Child)>, err: ShellError) -> ShellError {
    for (_, child) in stages.iter_mut() {
        let _ = child.start_kill();
    }
    PipelineHandle { stages }.detach();
    err
}

/// Files bound to a stage's stdin and stdout, if it redirects either.
fn open_redirects(stage: &Stage) -> Result<(Option<Stdio>, Option<Stdio>)> {
    let stdin = match &stage.stdin {
        Input::File(path) => Some(open_input(path)?.into()),
        Input::Inherit | Input::Pipe => None,
    };
    let stdout = match &stage.stdout {
        Output::Truncate(path) => Some(open_output(path, false)?.into()),
        Output::Append(path) => Some(open_output(path, true)?.into()),
        Output::Inherit | Output::Pipe => None,
    };
    Ok((stdin, stdout))
}

fn spawn_stage(stage: &Stage, stdin: Stdio, stdout: Stdio) -> Result<Child> {
    Command::new(&stage.program)
        .args(&stage.args)
        .stdin(stdin)
        .stdout(stdout)
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| ShellError::spawn(stage.program.clone(), e))
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| ShellError::io(path, e))
}

fn open_output(path: &Path, append: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).mode(REDIRECT_MODE);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path).map_err(|e| ShellError::io(path, e))
}
