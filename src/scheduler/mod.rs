pub mod multilevel;
pub mod queue;
pub mod task;

pub use multilevel::{PassReport, Scheduler};
pub use queue::TaskStore;
pub use task::{Priority, Task, TaskId, TaskStatus};
