//! Task execution for scheduled scripts.
//!
//! - [`TaskRunner`]: runs one task and folds the outcome into an
//!   [`ExecutionResult`](executor::ExecutionResult)
//! - [`ScriptEngine`]: the collaborator that actually runs a script path and
//!   returns its exit code. [`InterpreterEngine`] hands the path to an
//!   external interpreter such as `sh`.

pub mod executor;
pub mod script;

pub use executor::{ExecutionResult, TaskRunner};
pub use script::{InterpreterEngine, ScriptEngine};
