//! Completion handles for background tasks

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Terminal failures a background task can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task ran and reported an error.
    #[error("task failed: {0}")]
    Failed(String),

    /// The task was cancelled before it started.
    #[error("task was cancelled")]
    Cancelled,

    /// The wait deadline passed before the task finished.
    #[error("timed out waiting for task")]
    Timeout,
}

pub(super) enum TaskState<T> {
    Pending,
    Running,
    Done(T),
    Failed(String),
    Cancelled,
}

pub(super) struct TaskShared<T> {
    pub(super) state: Mutex<TaskState<T>>,
    pub(super) cond: Condvar,
}

impl<T> TaskShared<T> {
    pub(super) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(TaskState::Pending),
            cond: Condvar::new(),
        })
    }

    /// Marks the task running. Returns `false` when it was cancelled
    /// before a worker picked it up.
    pub(super) fn try_start(&self) -> bool {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if matches!(*state, TaskState::Pending) {
            *state = TaskState::Running;
            true
        } else {
            false
        }
    }

    /// Cancels a task that never started, waking any waiters.
    pub(super) fn cancel(&self) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if matches!(*state, TaskState::Pending) {
            *state = TaskState::Cancelled;
        }
        drop(state);
        self.cond.notify_all();
    }

    pub(super) fn complete(&self, outcome: Result<T, String>) {
        if let Ok(mut state) = self.state.lock() {
            *state = match outcome {
                Ok(value) => TaskState::Done(value),
                Err(message) => TaskState::Failed(message),
            };
        }
        self.cond.notify_all();
    }
}

/// Handle to one submitted task. Waiting consumes the handle; callers
/// that do not care about the result can just drop it.
pub struct TaskHandle<T> {
    pub(super) shared: Arc<TaskShared<T>>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task reaches a terminal state.
    pub fn wait(self) -> Result<T, TaskError> {
        let mut state = match self.shared.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        loop {
            match std::mem::replace(&mut *state, TaskState::Cancelled) {
                TaskState::Done(value) => return Ok(value),
                TaskState::Failed(message) => return Err(TaskError::Failed(message)),
                TaskState::Cancelled => return Err(TaskError::Cancelled),
                pending => {
                    *state = pending;
                    state = match self.shared.cond.wait(state) {
                        Ok(state) => state,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                }
            }
        }
    }

    /// Blocks until the task finishes or `timeout` elapses.
    pub fn wait_timeout(self, timeout: Duration) -> Result<T, TaskError> {
        let deadline = Instant::now() + timeout;
        let mut state = match self.shared.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        loop {
            match std::mem::replace(&mut *state, TaskState::Cancelled) {
                TaskState::Done(value) => return Ok(value),
                TaskState::Failed(message) => return Err(TaskError::Failed(message)),
                TaskState::Cancelled => return Err(TaskError::Cancelled),
                pending => {
                    *state = pending;
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(TaskError::Timeout);
                    }
                    let (guard, result) = match self.shared.cond.wait_timeout(state, remaining) {
                        Ok(pair) => pair,
                        Err(poisoned) => {
                            let pair = poisoned.into_inner();
                            (pair.0, pair.1)
                        }
                    };
                    state = guard;
                    if result.timed_out() {
                        // Re-check once in case completion raced the timeout
                        match std::mem::replace(&mut *state, TaskState::Cancelled) {
                            TaskState::Done(value) => return Ok(value),
                            TaskState::Failed(message) => {
                                return Err(TaskError::Failed(message))
                            }
                            TaskState::Cancelled => return Err(TaskError::Cancelled),
                            pending => {
                                *state = pending;
                                return Err(TaskError::Timeout);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Cancels the task if it has not started running. Returns `true`
    /// when the cancellation took effect.
    pub fn cancel(&self) -> bool {
        let mut state = match self.shared.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if matches!(*state, TaskState::Pending) {
            *state = TaskState::Cancelled;
            self.shared.cond.notify_all();
            true
        } else {
            false
        }
    }

    /// True once the task reached any terminal state.
    pub fn is_finished(&self) -> bool {
        match self.shared.state.lock() {
            Ok(state) => !matches!(*state, TaskState::Pending | TaskState::Running),
            Err(_) => true,
        }
    }
}

/// Builds a handle that is already failed, for submissions rejected by a
/// shut-down executor.
pub(super) fn failed_handle<T>(message: impl Into<String>) -> TaskHandle<T> {
    let shared = TaskShared::new();
    shared.complete(Err(message.into()));
    TaskHandle { shared }
}
