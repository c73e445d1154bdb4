use std::time::Duration;

/// Identity of a recurring job.
///
/// A kind is only "recognized" by a scheduler once it has been registered on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    History,
    WalletInfo,
    Staking,
}

/// Point-in-time view of a registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub kind: TaskKind,
    pub interval: Duration,
    pub running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickCause {
    /// `start` was called (including on an already running task).
    Started,
    /// The task's interval elapsed while it was running.
    Elapsed,
    /// `stop` was called (including on an already stopped task).
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTickEvent {
    pub task: TaskKind,
    pub running: bool,
    pub cause: TickCause,
}

impl PollTickEvent {
    pub(crate) fn started(task: TaskKind) -> Self {
        Self { task, running: true, cause: TickCause::Started }
    }

    pub(crate) fn elapsed(task: TaskKind) -> Self {
        Self { task, running: true, cause: TickCause::Elapsed }
    }

    pub(crate) fn stopped(task: TaskKind) -> Self {
        Self { task, running: false, cause: TickCause::Stopped }
    }

    /// True for the events that should trigger a fetch cycle.
    pub fn is_tick(&self) -> bool {
        self.running && self.cause == TickCause::Elapsed
    }
}

/// Handle returned by `PollingScheduler::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
