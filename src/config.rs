use serde::{Deserialize, Serialize};

/// Upper bound on concurrently running low-priority tasks when none is given.
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// Configuration for a scheduling pass.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of low-priority tasks running at the same time.
    /// Values below 1 are treated as 1.
    pub max_parallel: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

impl SchedulerConfig {
    pub fn new(max_parallel: usize) -> Self {
        Self { max_parallel }
    }

    /// Effective worker pool size, never zero.
    pub fn worker_limit(&self) -> usize {
        self.max_parallel.max(1)
    }
}

/// External program used to run a scheduled script.
///
/// A task with command `path` runs as `program args... path`.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            program: "sh".to_string(),
            args: Vec::new(),
        }
    }
}

impl InterpreterConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Rendering used by `jscheduleview`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct ShellConfig {
    pub scheduler: SchedulerConfig,
    pub interpreter: InterpreterConfig,
    pub output: OutputFormat,
}

impl ShellConfig {
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.scheduler.max_parallel = max_parallel;
        self
    }

    pub fn with_interpreter(mut self, interpreter: InterpreterConfig) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }
}
