// Tick-driven priority scheduler: one-tick quantum, preemptive by priority.

use std::cmp::Ordering;
use std::collections::binary_heap::{BinaryHeap, PeekMut};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{MAX_PRIORITY, MIN_PRIORITY};
use crate::error::{EngineError, Result};

/// Monotonic submission sequence number, also the task's id.
pub type TaskId = u64;

/// A submitted task. `ticks` is the number of ticks still owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub priority: u8,
    pub ticks: u32,
    pub created_at: DateTime<Utc>,
}

/// A task that ran out of ticks, frozen at completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedTask {
    #[serde(flatten)]
    pub task: Task,
    pub executed_at: DateTime<Utc>,
}

/// One tick of work: which task ran and how many ticks it has left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Execution {
    pub id: TaskId,
    pub name: String,
    pub priority: u8,
    pub ticks: u32,
}

impl From<&Task> for Execution {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            priority: task.priority,
            ticks: task.ticks,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerSnapshot {
    /// Pending tasks in dispatch order.
    pub queue: Vec<Task>,
    /// Completed tasks in execution order.
    pub history: Vec<CompletedTask>,
}

/// Executions of one run call plus the state it left behind.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub executed: Vec<Execution>,
    pub queue: Vec<Task>,
    pub history: Vec<CompletedTask>,
}

/// Heap wrapper: the "greatest" task is the next to dispatch, i.e. the
/// lowest priority number, then the earliest submission.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Queued(Task);

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .priority
            .cmp(&self.0.priority)
            .then_with(|| other.0.id.cmp(&self.0.id))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct SchedulerState {
    queue: BinaryHeap<Queued>,
    history: Vec<CompletedTask>,
    next_id: TaskId,
}

impl SchedulerState {
    fn queue_in_dispatch_order(&self) -> Vec<Task> {
        let mut sorted = self.queue.clone().into_sorted_vec();
        sorted.reverse();
        sorted.into_iter().map(|q| q.0).collect()
    }
}

pub struct PriorityScheduler {
    state: Mutex<SchedulerState>,
    max_run_ticks: u32,
}

impl PriorityScheduler {
    pub fn new(max_run_ticks: u32) -> Self {
        Self {
            state: Mutex::new(SchedulerState::default()),
            max_run_ticks,
        }
    }

    /// Validate and enqueue a task. Nothing is mutated on failure.
    pub fn submit(&self, name: &str, priority: i64, ticks: i64) -> Result<Task> {
        if name.trim().is_empty() {
            return Err(EngineError::InvalidArgument(
                "task name must not be empty".to_string(),
            ));
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(EngineError::InvalidArgument(format!(
                "priority must be in [{}, {}], got {}",
                MIN_PRIORITY, MAX_PRIORITY, priority
            )));
        }
        if ticks < 1 || ticks > i64::from(u32::MAX) {
            return Err(EngineError::InvalidArgument(format!(
                "ticks must be >= 1, got {}",
                ticks
            )));
        }

        let mut state = self.state.lock();
        state.next_id += 1;
        let task = Task {
            id: state.next_id,
            name: name.to_string(),
            priority: priority as u8,
            ticks: ticks as u32,
            created_at: Utc::now(),
        };
        state.queue.push(Queued(task.clone()));
        debug!(
            "task submitted id={} name={} priority={} ticks={}",
            task.id, task.name, task.priority, task.ticks
        );
        Ok(task)
    }

    /// Perform `n` tick-steps and return one record per tick that found a task.
    pub fn run(&self, n: i64) -> Result<Vec<Execution>> {
        let ticks = self.validate_run_ticks(n)?;
        let mut state = self.state.lock();
        Ok(Self::run_locked(&mut state, ticks))
    }

    /// `run`, plus the queue and history as they stand afterwards.
    pub fn run_with_snapshot(&self, n: i64) -> Result<RunReport> {
        let ticks = self.validate_run_ticks(n)?;
        let mut state = self.state.lock();
        let executed = Self::run_locked(&mut state, ticks);
        Ok(RunReport {
            executed,
            queue: state.queue_in_dispatch_order(),
            history: state.history.clone(),
        })
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let state = self.state.lock();
        SchedulerSnapshot {
            queue: state.queue_in_dispatch_order(),
            history: state.history.clone(),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn validate_run_ticks(&self, n: i64) -> Result<u32> {
        if n < 1 || n > i64::from(self.max_run_ticks) {
            return Err(EngineError::InvalidArgument(format!(
                "ticks must be in [1, {}], got {}",
                self.max_run_ticks, n
            )));
        }
        Ok(n as u32)
    }

    fn run_locked(state: &mut SchedulerState, ticks: u32) -> Vec<Execution> {
        let SchedulerState { queue, history, .. } = state;
        let mut executed = Vec::new();

        for _ in 0..ticks {
            // Empty queue: the remaining steps are no-ops.
            let Some(mut head) = queue.peek_mut() else {
                break;
            };
            head.0.ticks -= 1;
            executed.push(Execution::from(&head.0));

            if head.0.ticks == 0 {
                let task = PeekMut::pop(head).0;
                info!("task completed id={} name={}", task.id, task.name);
                history.push(CompletedTask {
                    task,
                    executed_at: Utc::now(),
                });
            }
        }

        executed
    }
}
