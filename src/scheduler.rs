//! Cancellable delayed tasks.
//! `TokioScheduler` runs tasks on the tokio runtime after a real sleep;
//! `ManualScheduler` keeps a virtual clock that only moves on `advance`, so
//! debounce behaviour is testable without waiting. `Debouncer` builds the
//! restart-on-trigger policy on top of either.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle to one scheduled task. Cancelling is idempotent and a no-op once
/// the task has run.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    token: CancellationToken,
}

impl TaskHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay` unless the returned handle is cancelled
    /// first.
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle;
}

/// Scheduler backed by tokio timers.
pub struct TokioScheduler {
    runtime: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }

    /// Bind to the runtime of the calling task. Panics outside a runtime,
    /// like `tokio::spawn`.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let token = handle.token.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if !token.is_cancelled() {
                        task();
                    }
                }
                _ = token.cancelled() => {
                    trace!("delayed task cancelled");
                }
            }
        });
        handle
    }
}

struct ManualEntry {
    due: Duration,
    seq: u64,
    handle: TaskHandle,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_seq: u64,
    queue: Vec<ManualEntry>,
}

/// Virtual-time scheduler. Tasks run synchronously inside `advance`.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward, running every task that comes due, in due
    /// order. Tasks may schedule further tasks; those run too if they fall
    /// inside the window.
    pub fn advance(&self, by: Duration) {
        let target = self.state.lock().now + by;
        loop {
            let next = {
                let mut state = self.state.lock();
                state.queue.retain(|entry| !entry.handle.is_cancelled());
                let earliest = state
                    .queue
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| entry.due <= target)
                    .min_by_key(|(_, entry)| (entry.due, entry.seq))
                    .map(|(idx, _)| idx);
                match earliest {
                    Some(idx) => {
                        let entry = state.queue.swap_remove(idx);
                        state.now = entry.due.max(state.now);
                        Some(entry)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };
            match next {
                Some(entry) => {
                    entry.handle.cancel();
                    (entry.task)();
                }
                None => break,
            }
        }
    }

    /// Tasks scheduled and neither run nor cancelled.
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .queue
            .iter()
            .filter(|entry| !entry.handle.is_cancelled())
            .count()
    }

    pub fn now(&self) -> Duration {
        self.state.lock().now
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        let due = state.now + delay;
        state.queue.push(ManualEntry {
            due,
            seq,
            handle: handle.clone(),
            task,
        });
        handle
    }
}

/// Coalesces bursts of triggers into one run, `quiet` after the last one.
pub struct Debouncer {
    scheduler: Arc<dyn Scheduler>,
    quiet: Duration,
    pending: Mutex<Option<TaskHandle>>,
}

impl Debouncer {
    pub fn new(scheduler: Arc<dyn Scheduler>, quiet: Duration) -> Self {
        Self {
            scheduler,
            quiet,
            pending: Mutex::new(None),
        }
    }

    /// Cancel any pending run and start the quiet period again.
    pub fn trigger(&self, task: Task) {
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.cancel();
        }
        *pending = Some(self.scheduler.schedule(self.quiet, task));
    }

    /// Drop the pending run, if any. Returns whether one was cancelled.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) => {
                let was_live = !handle.is_cancelled();
                handle.cancel();
                was_live
            }
            None => false,
        }
    }
}
