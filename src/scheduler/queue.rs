use std::collections::VecDeque;

use crate::error::{Result, ShellError};
use crate::scheduler::task::{Priority, Task, TaskId};

/// Owns the two scheduling queues and the task id counter.
///
/// Ids start at 1 and are never reused, even after a task is cancelled or
/// drained. A task lives in exactly one queue, chosen by its priority when it
/// was added.
#[derive(Debug)]
pub struct TaskStore {
    high: VecDeque<Task>,
    low: VecDeque<Task>,
    next_id: TaskId,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            high: VecDeque::new(),
            low: VecDeque::new(),
            next_id: 1,
        }
    }

    fn queue_mut(&mut self, priority: Priority) -> &mut VecDeque<Task> {
        match priority {
            Priority::High => &mut self.high,
            Priority::Low => &mut self.low,
        }
    }

    /// Queue a new task and return its id.
    pub fn add_task(&mut self, command: impl Into<String>, priority: Priority) -> Result<TaskId> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(ShellError::InvalidTask);
        }

        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(ShellError::IdsExhausted)?;
        self.queue_mut(priority)
            .push_back(Task::new(id, command, priority));
        tracing::info!(task_id = id, %priority, "Task scheduled");
        Ok(id)
    }

    /// Remove the task with `id` from whichever queue holds it.
    /// Returns false if no queued task has that id.
    pub fn cancel_task(&mut self, id: TaskId) -> bool {
        for queue in [&mut self.high, &mut self.low] {
            if let Some(pos) = queue.iter().position(|t| t.id == id) {
                queue.remove(pos);
                tracing::info!(task_id = id, "Task cancelled");
                return true;
            }
        }
        false
    }

    /// Replace the command of a queued task in place.
    /// Returns false if no queued task has that id.
    pub fn modify_task(&mut self, id: TaskId, command: impl Into<String>) -> Result<bool> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(ShellError::InvalidTask);
        }

        match self.get_task_mut(id) {
            Some(task) => {
                task.command = command;
                tracing::info!(task_id = id, "Task modified");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.high.iter().chain(self.low.iter()).find(|t| t.id == id)
    }

    fn get_task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.high
            .iter_mut()
            .chain(self.low.iter_mut())
            .find(|t| t.id == id)
    }

    /// All queued tasks, high queue first, each queue in FIFO order.
    pub fn snapshot(&self) -> Vec<Task> {
        self.high.iter().chain(self.low.iter()).cloned().collect()
    }

    /// Tasks of one queue in FIFO order.
    pub fn tasks(&self, priority: Priority) -> Vec<&Task> {
        match priority {
            Priority::High => self.high.iter().collect(),
            Priority::Low => self.low.iter().collect(),
        }
    }

    /// Empty the high queue, returning its former contents in FIFO order.
    pub fn drain_high(&mut self) -> Vec<Task> {
        self.high.drain(..).collect()
    }

    /// Empty the low queue, returning its former contents in FIFO order.
    pub fn drain_low(&mut self) -> Vec<Task> {
        self.low.drain(..).collect()
    }

    /// Re-queue previously persisted tasks, keeping their ids.
    ///
    /// Only ids this store has never handed out are accepted: a task whose id
    /// is below the counter at the start of the restore (queued, cancelled or
    /// already run) is skipped, as is a repeat within `tasks` and the largest
    /// possible id. The counter then moves past the largest restored id.
    /// Returns the number of tasks restored.
    pub fn restore(&mut self, tasks: impl IntoIterator<Item = Task>) -> usize {
        let floor = self.next_id;
        let mut restored = 0;
        for task in tasks {
            if task.id < floor || self.get_task(task.id).is_some() {
                tracing::warn!(task_id = task.id, "Skipping restored task with an id already used");
                continue;
            }
            let Some(next) = task.id.checked_add(1) else {
                tracing::warn!(task_id = task.id, "Skipping restored task with out of range id");
                continue;
            };
            self.next_id = self.next_id.max(next);
            self.queue_mut(task.priority).push_back(task);
            restored += 1;
        }
        restored
    }

    /// The id the next added task will receive.
    pub fn peek_next_id(&self) -> TaskId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.high.len() + self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.low.is_empty()
    }
}
