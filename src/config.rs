use std::time::Duration;

/// How often history is polled.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound on a single fetch before the cycle gives up and restarts.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// The only page size the history view asks for.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Tunables for one history view.
///
/// Failed and successful cycles share the same `interval`; a backoff policy
/// would replace that single value without touching the cycle itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub interval: Duration,
    /// `None` waits on the client indefinitely.
    pub fetch_timeout: Option<Duration>,
    pub skip: u32,
    pub take: u32,
    /// Run one cycle as soon as the view mounts instead of one interval later.
    pub fetch_on_mount: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
            skip: 0,
            take: DEFAULT_PAGE_SIZE,
            fetch_on_mount: true,
        }
    }
}

impl SyncConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_take(mut self, take: u32) -> Self {
        self.take = take;
        self
    }

    pub fn with_fetch_on_mount(mut self, fetch_on_mount: bool) -> Self {
        self.fetch_on_mount = fetch_on_mount;
        self
    }
}
