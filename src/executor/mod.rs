//! Background task executor
//!
//! A fixed pool of worker threads draining a crossbeam channel of boxed
//! jobs. The vault submits save and load work here so the game thread
//! never blocks on disk or crypto. Callers get a [`TaskHandle`] per
//! submission and can wait, wait with a timeout, or cancel a task that
//! has not started yet.

mod handle;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Sender};

use crate::logging::SaveLogger;

pub use handle::{TaskError, TaskHandle};

use handle::{failed_handle, TaskShared};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// How long [`TaskExecutor::shutdown`] waits for the backlog to drain
/// before cancelling what is left.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Outcome of a batch of independent operations. Items never roll each
/// other back; a failure is recorded and the rest proceed.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub failed_ids: Vec<String>,
    pub duration: Duration,
}

impl BatchResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Fixed-size worker pool for save-store background work.
pub struct TaskExecutor {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    halted: Arc<AtomicBool>,
    pending: Arc<AtomicU64>,
    completed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    logger: Arc<dyn SaveLogger>,
}

impl TaskExecutor {
    /// Spawns a pool sized to the machine's parallelism.
    pub fn new(logger: Arc<dyn SaveLogger>) -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::with_workers(workers, logger)
    }

    /// Spawns a pool with an explicit worker count (minimum 1).
    pub fn with_workers(workers: usize, logger: Arc<dyn SaveLogger>) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = unbounded::<Job>();

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let receiver = receiver.clone();
            let spawned = thread::Builder::new()
                .name(format!("savevault-worker-{index}"))
                .spawn(move || {
                    // Channel close drains remaining jobs then ends the loop
                    for job in receiver.iter() {
                        job();
                    }
                });
            if let Ok(handle) = spawned {
                handles.push(handle);
            }
        }

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(handles),
            halted: Arc::new(AtomicBool::new(false)),
            pending: Arc::new(AtomicU64::new(0)),
            completed: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
            logger,
        }
    }

    /// Submits a job. After [`TaskExecutor::shutdown`] the returned
    /// handle is already failed instead of panicking.
    pub fn submit<T, F>(&self, job: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, String> + Send + 'static,
    {
        let sender = match self.sender.lock() {
            Ok(guard) => (*guard).clone(),
            Err(_) => None,
        };
        let Some(sender) = sender else {
            self.logger
                .warn("TaskExecutor", "submit after shutdown rejected");
            return failed_handle("executor is shut down");
        };

        let shared = TaskShared::new();
        let worker_shared = Arc::clone(&shared);
        self.pending.fetch_add(1, Ordering::SeqCst);

        let halted = Arc::clone(&self.halted);
        let pending = Arc::clone(&self.pending);
        let completed = Arc::clone(&self.completed);
        let failed = Arc::clone(&self.failed);
        let wrapped: Job = Box::new(move || {
            if halted.load(Ordering::SeqCst) {
                // Shutdown grace expired while this job sat in the queue
                worker_shared.cancel();
                pending.fetch_sub(1, Ordering::SeqCst);
                return;
            }
            if !worker_shared.try_start() {
                // Cancelled before a worker got to it
                pending.fetch_sub(1, Ordering::SeqCst);
                return;
            }
            let outcome = job();
            if outcome.is_ok() {
                completed.fetch_add(1, Ordering::SeqCst);
            } else {
                failed.fetch_add(1, Ordering::SeqCst);
            }
            worker_shared.complete(outcome);
            pending.fetch_sub(1, Ordering::SeqCst);
        });

        if sender.send(wrapped).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return failed_handle("executor is shut down");
        }
        TaskHandle { shared }
    }

    /// Tasks submitted but not yet finished.
    pub fn pending_count(&self) -> u64 {
        self.pending.load(Ordering::SeqCst)
    }

    /// Tasks that finished successfully.
    pub fn completed_count(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Tasks that finished with an error.
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Blocks until no tasks are pending or `timeout` elapses. Returns
    /// `true` when the pool went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.pending.load(Ordering::SeqCst) == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Stops accepting work and drains queued jobs, waiting up to the
    /// default grace period before giving up on the backlog.
    pub fn shutdown(&self) {
        self.shutdown_within(SHUTDOWN_GRACE);
    }

    /// Stops accepting work and waits up to `grace` for queued jobs to
    /// drain. Jobs still queued when the grace expires are cancelled and
    /// the workers are detached, so shutdown time never scales with the
    /// backlog. A job already running is left to finish on its own.
    pub fn shutdown_within(&self, grace: Duration) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if sender.is_none() {
            return;
        }
        // Dropping the only external sender closes the channel once the
        // workers finish draining it
        drop(sender);

        let drained = self.wait_idle(grace);
        let workers = match self.workers.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        };
        if drained {
            for worker in workers {
                let _ = worker.join();
            }
            self.logger.info("TaskExecutor", "executor shut down");
            return;
        }

        // The workers see the flag, cancel everything still queued, and
        // exit once the channel empties. Joining here could block behind
        // a stuck job, so the handles are dropped instead.
        self.halted.store(true, Ordering::SeqCst);
        drop(workers);
        self.logger.warn(
            "TaskExecutor",
            "shutdown grace expired, cancelling queued tasks",
        );
    }
}

impl Drop for TaskExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
