use std::sync::Arc;

use tokio::sync::{RwLock, Semaphore};

use crate::config::SchedulerConfig;
use crate::scheduler::queue::TaskStore;
use crate::scheduler::task::Task;
use crate::worker::{ExecutionResult, TaskRunner};

/// Outcome of one scheduling pass.
#[derive(Debug, Default)]
pub struct PassReport {
    /// High-priority results in execution order.
    pub high: Vec<ExecutionResult>,
    /// Low-priority results ordered by task id.
    pub low: Vec<ExecutionResult>,
}

impl PassReport {
    pub fn total(&self) -> usize {
        self.high.len() + self.low.len()
    }

    pub fn failed(&self) -> usize {
        self.results().filter(|r| !r.success()).count()
    }

    pub fn results(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.high.iter().chain(self.low.iter())
    }
}

/// Two-level scheduler.
///
/// A pass drains the high queue and runs those tasks one at a time in FIFO
/// order, then drains the low queue and runs those tasks on a worker pool
/// bounded by [`SchedulerConfig::max_parallel`]. The high queue is called
/// round robin but is not time-sliced: each task runs to completion before
/// the next starts.
#[derive(Debug, Clone)]
pub struct Scheduler {
    runner: TaskRunner,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(runner: TaskRunner, config: SchedulerConfig) -> Self {
        Self { runner, config }
    }

    /// Run every task currently queued. Both queues are empty afterwards,
    /// whatever the individual task outcomes.
    ///
    /// The store lock is held only while draining, so commands issued during
    /// the pass see the queues as already emptied.
    pub async fn run_all(&self, store: &RwLock<TaskStore>) -> PassReport {
        tracing::info!("Multi-level scheduling pass started");

        let high = store.write().await.drain_high();
        let high = self.run_high(high).await;

        let low = store.write().await.drain_low();
        let low = self.run_low(low).await;

        let report = PassReport { high, low };
        tracing::info!(
            total = report.total(),
            failed = report.failed(),
            "Multi-level scheduling pass finished"
        );
        report
    }

    async fn run_high(&self, tasks: Vec<Task>) -> Vec<ExecutionResult> {
        tracing::info!(count = tasks.len(), "Round robin queue (high priority)");
        let mut results = Vec::with_capacity(tasks.len());
        for task in &tasks {
            results.push(self.runner.run(task).await);
        }
        results
    }

    async fn run_low(&self, tasks: Vec<Task>) -> Vec<ExecutionResult> {
        let limit = self.config.worker_limit();
        tracing::info!(count = tasks.len(), limit, "FCFS queue (low priority)");

        let semaphore = Arc::new(Semaphore::new(limit));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            // Tasks are started in FIFO order as pool slots free up
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let runner = self.runner.clone();
            let owned = task.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                runner.run(&owned).await
            });
            handles.push((task, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (task, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!(task_id = task.id, error = %e, "[Scheduler] Error: task worker panicked");
                    results.push(ExecutionResult::failed(&task, None, e.to_string()));
                }
            }
        }
        results.sort_by_key(|r| r.task_id);
        results
    }
}
