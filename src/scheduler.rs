use crate::job::Job;
use crate::walker::FileWalker;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{dispatcher, error, info, Dispatch};

/// The work performed for one job.
///
/// The scheduler only cares that a run finishes (or panics); any result is
/// reported by the runner itself.
pub trait JobRunner: Send + Sync + 'static {
    fn run(&self, job: &Job);
}

impl JobRunner for FileWalker {
    fn run(&self, job: &Job) {
        self.walk(job);
    }
}

/// Snapshot of the scheduler's shared state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    pub is_running: bool,
    pub active_task_count: usize,
}

#[derive(Default)]
struct Shared {
    state: Mutex<RunState>,
    idle: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RunState> {
        // The state is two plain fields that are always left consistent, so a
        // poisoned lock is still safe to use.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decrements the active task count when dropped, on every exit path.
struct CompletionGuard {
    shared: Arc<Shared>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.active_task_count = state.active_task_count.saturating_sub(1);
        info!(remaining = state.active_task_count, "job finished");
        if state.active_task_count == 0 && state.is_running {
            state.is_running = false;
            info!("batch complete");
            self.shared.idle.notify_all();
        }
    }
}

/// Runs batches of jobs, one OS thread per job.
///
/// Only one batch may be in flight at a time; [`Scheduler::start_batch`]
/// returns `false` without side effects while a batch is running. There is no
/// concurrency cap and no cancellation.
pub struct Scheduler {
    runner: Arc<dyn JobRunner>,
    shared: Arc<Shared>,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self {
            runner,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Accepts a batch and starts one task per job.
    ///
    /// Returns `false` if a batch is already running or `jobs` is empty.
    pub fn start_batch(&self, jobs: Vec<Job>) -> bool {
        let mut state = self.shared.lock();
        if state.is_running {
            info!("a batch is already running, ignoring new batch");
            return false;
        }
        if jobs.is_empty() {
            info!("no valid jobs in batch");
            return false;
        }

        state.is_running = true;
        state.active_task_count = jobs.len();
        drop(state);
        info!(jobs = jobs.len(), "starting batch");

        // Job threads report through the caller's subscriber.
        let dispatch = dispatcher::get_default(Dispatch::clone);

        for (idx, job) in jobs.into_iter().enumerate() {
            let guard = CompletionGuard {
                shared: Arc::clone(&self.shared),
            };
            let runner = Arc::clone(&self.runner);
            let dispatch = dispatch.clone();

            let spawned = thread::Builder::new()
                .name(format!("nforetag-job-{idx}"))
                .spawn(move || {
                    dispatcher::with_default(&dispatch, || run_task(runner.as_ref(), &job, guard))
                });

            // On failure the closure is dropped and its guard still decrements.
            if let Err(e) = spawned {
                error!("failed to spawn job thread: {e}");
            }
        }

        true
    }

    /// `true` while a batch is in flight.
    pub fn is_busy(&self) -> bool {
        self.shared.lock().is_running
    }

    pub fn active_tasks(&self) -> usize {
        self.shared.lock().active_task_count
    }

    pub fn state(&self) -> RunState {
        *self.shared.lock()
    }

    /// Blocks until no batch is running.
    pub fn wait_idle(&self) {
        let state = self.shared.lock();
        let _state = self
            .shared
            .idle
            .wait_while(state, |s| s.is_running)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`Scheduler::wait_idle`] with an upper bound; returns `true` if idle.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .idle
            .wait_timeout_while(state, timeout, |s| s.is_running)
            .unwrap_or_else(PoisonError::into_inner);
        !state.is_running
    }
}

fn run_task(runner: &dyn JobRunner, job: &Job, _guard: CompletionGuard) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| runner.run(job)));
    if let Err(payload) = result {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(job = %job, "job panicked: {message}");
    }
}
