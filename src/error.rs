use std::path::PathBuf;

use thiserror::Error;

use crate::scheduler::TaskId;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Invalid task: command is empty")]
    InvalidTask,

    #[error("No task ids left to assign")]
    IdsExhausted,

    #[error("Task {0} not found")]
    NotFound(TaskId),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported pipeline: {0}")]
    UnsupportedPipeline(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Failed to render tasks: {0}")]
    Render(#[from] serde_json::Error),

    #[error("{}:{line}: {reason}", path.display())]
    Persistence {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl ShellError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ShellError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        ShellError::Spawn {
            program: program.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
