//! Named, cancelable recurring timers.
//!
//! A `PollingScheduler` owns one timer per registered `TaskKind` and fans every
//! transition (start, stop, elapsed interval) out to its subscribers.
//!
//! # Guarantees
//! * **Synchronous delivery**: handlers run on the caller's stack before
//!   `start`/`stop` return. Handlers may call back into the scheduler.
//! * **No stale ticks**: every `start` bumps the task's timer generation and the
//!   timer re-checks it before firing, so a stopped timer never ticks again.
//! * **No globals**: a scheduler is an explicit handle. Clone it into every
//!   consumer that needs it; dropping the last clone aborts all timers.
//!
//! The scheduler itself never fetches anything. Consumers implement the
//! stop → fetch → restart discipline on top of it (see `history::runtime`).

pub mod types;


pub use types::{PollTickEvent, SubscriptionId, Task, TaskKind, TickCause};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::SchedulerError;

type Handler = Arc<dyn Fn(&PollTickEvent) + Send + Sync>;

struct TaskSlot {
    interval: Duration,
    running: bool,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    tasks: HashMap<TaskKind, TaskSlot>,
    subscribers: Vec<(SubscriptionId, Handler)>,
    next_subscription: u64,
}

impl Inner {
    fn handlers(&self) -> Vec<Handler> {
        self.subscribers.iter().map(|(_, h)| h.clone()).collect()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for slot in self.tasks.values_mut() {
            if let Some(timer) = slot.timer.take() {
                timer.abort();
            }
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn dispatch(handlers: &[Handler], event: &PollTickEvent) {
    for handler in handlers {
        handler(event);
    }
}

/// Cooperative recurring-task scheduler.
///
/// Cheap to clone; all clones share the same tasks and subscribers.
#[derive(Clone)]
pub struct PollingScheduler {
    inner: Arc<Mutex<Inner>>,
}

impl Default for PollingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PollingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("PollingScheduler")
            .field("tasks", &inner.tasks.len())
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl PollingScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tasks: HashMap::new(),
                subscribers: Vec::new(),
                next_subscription: 0,
            })),
        }
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_task(self, kind: TaskKind, interval: Duration) -> Result<Self, SchedulerError> {
        self.register(kind, interval)?;
        Ok(self)
    }

    /// Makes `kind` a recognized task.
    ///
    /// Registering an existing task only changes its interval; a running timer
    /// picks the new value up on its next `start`.
    pub fn register(&self, kind: TaskKind, interval: Duration) -> Result<(), SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval(kind));
        }

        let mut inner = lock(&self.inner);
        inner
            .tasks
            .entry(kind)
            .and_modify(|slot| slot.interval = interval)
            .or_insert(TaskSlot {
                interval,
                running: false,
                generation: 0,
                timer: None,
            });
        log::debug!("[SCHED] registered {:?} every {:?}", kind, interval);
        Ok(())
    }

    /// Arms the recurring timer for `kind`. The first tick fires one interval later.
    ///
    /// Starting a running task leaves its timer alone but still notifies subscribers.
    ///
    /// # Panics
    /// Arming a timer spawns a tokio task, so this must be called from within a
    /// tokio runtime.
    pub fn start(&self, kind: TaskKind) -> Result<(), SchedulerError> {
        let handlers = {
            let mut inner = lock(&self.inner);
            let weak = Arc::downgrade(&self.inner);
            let slot = inner
                .tasks
                .get_mut(&kind)
                .ok_or(SchedulerError::UnknownTask(kind))?;

            if slot.running {
                log::trace!("[SCHED] start({:?}): already running", kind);
            } else {
                slot.running = true;
                slot.generation += 1;
                slot.timer = Some(spawn_timer(weak, kind, slot.interval, slot.generation));
                log::debug!("[SCHED] start({:?}) gen={}", kind, slot.generation);
            }

            inner.handlers()
        };

        dispatch(&handlers, &PollTickEvent::started(kind));
        Ok(())
    }

    /// Halts future ticks for `kind`. Idempotent; always notifies subscribers.
    pub fn stop(&self, kind: TaskKind) -> Result<(), SchedulerError> {
        let handlers = {
            let mut inner = lock(&self.inner);
            let slot = inner
                .tasks
                .get_mut(&kind)
                .ok_or(SchedulerError::UnknownTask(kind))?;

            if slot.running {
                slot.running = false;
                if let Some(timer) = slot.timer.take() {
                    timer.abort();
                }
                log::debug!("[SCHED] stop({:?})", kind);
            } else {
                log::trace!("[SCHED] stop({:?}): already stopped", kind);
            }

            inner.handlers()
        };

        dispatch(&handlers, &PollTickEvent::stopped(kind));
        Ok(())
    }

    /// Registers `handler` for every transition of every task.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&PollTickEvent) + Send + Sync + 'static,
    {
        let mut inner = lock(&self.inner);
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        inner.subscribers.push((id, Arc::new(handler)));
        log::trace!("[SCHED] subscribe -> {:?} ({} total)", id, inner.subscribers.len());
        id
    }

    /// Returns `false` when `id` was not (or no longer) subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = lock(&self.inner);
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        before != inner.subscribers.len()
    }

    pub fn is_running(&self, kind: TaskKind) -> Result<bool, SchedulerError> {
        self.task(kind)
            .map(|t| t.running)
            .ok_or(SchedulerError::UnknownTask(kind))
    }

    pub fn task(&self, kind: TaskKind) -> Option<Task> {
        let inner = lock(&self.inner);
        inner.tasks.get(&kind).map(|slot| Task {
            kind,
            interval: slot.interval,
            running: slot.running,
        })
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

/// One timer per (task, generation). Exits when the scheduler is gone or the
/// task has been stopped or restarted since it was armed.
fn spawn_timer(
    inner: Weak<Mutex<Inner>>,
    kind: TaskKind,
    interval: Duration,
    generation: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let handlers = {
                let Some(inner) = inner.upgrade() else { break };
                let guard = lock(&inner);
                let current = matches!(
                    guard.tasks.get(&kind),
                    Some(slot) if slot.running && slot.generation == generation
                );
                if !current {
                    break;
                }
                guard.handlers()
            };

            log::trace!("[SCHED] tick {:?} gen={}", kind, generation);
            dispatch(&handlers, &PollTickEvent::elapsed(kind));
        }
    })
}
