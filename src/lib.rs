pub mod config;
pub mod error;
pub mod persistence;
pub mod pipeline;
pub mod scheduler;
pub mod shell;
pub mod shutdown;
pub mod worker;

pub use error::{Result, ShellError};
pub use shell::{Reply, Shell};
