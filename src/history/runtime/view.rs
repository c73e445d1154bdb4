use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::error::{FetchError, SchedulerError};
use crate::history::api::{ErrorSink, HistoryFetchClient, LifecycleSignal, LogErrorSink, WalletIdentity};
use crate::history::normalizer::normalize;
use crate::history::types::{HistoryPresence, HistoryResponse, TransactionRecord};
use crate::scheduler::{PollTickEvent, PollingScheduler, SubscriptionId, TaskKind, TickCause};

/// Where the history task is in its lifecycle.
///
/// `Idle → Running → Fetching → Running → … → Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    #[default]
    Idle,
    Running,
    Fetching,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    pub records: Vec<TransactionRecord>,
    pub presence: HistoryPresence,
    pub phase: CyclePhase,
    /// Settled cycles, successful or not.
    pub cycles: u64,
    pub failures: u64,
}

struct Shared {
    snapshot: Mutex<HistorySnapshot>,
    mounted: AtomicBool,
    /// Bumped on every mount and unmount; a worker only restarts the task
    /// while the mount it was spawned for is still the current one.
    epoch: AtomicU64,
    /// Held for the whole fetch, so two workers of the same view never overlap.
    fetch_gate: tokio::sync::Mutex<()>,
}

impl Shared {
    fn snapshot(&self) -> MutexGuard<'_, HistorySnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps the first page of one wallet's history fresh.
///
/// The view registers `TaskKind::History` on the injected scheduler and reacts
/// to its ticks with a stop → fetch → restart cycle.
pub struct HistoryView<C, S = LogErrorSink> {
    scheduler: PollingScheduler,
    client: Arc<C>,
    sink: Arc<S>,
    wallet: WalletIdentity,
    config: SyncConfig,
    shared: Arc<Shared>,
    subscription: Option<SubscriptionId>,
    worker: Option<JoinHandle<()>>,
}

impl<C, S> HistoryView<C, S>
where
    C: HistoryFetchClient + 'static,
    S: ErrorSink + 'static,
{
    pub fn new(
        scheduler: PollingScheduler,
        client: Arc<C>,
        sink: Arc<S>,
        wallet: WalletIdentity,
        config: SyncConfig,
    ) -> Result<Self, SchedulerError> {
        scheduler.register(TaskKind::History, config.interval)?;

        Ok(Self {
            scheduler,
            client,
            sink,
            wallet,
            config,
            shared: Arc::new(Shared {
                snapshot: Mutex::new(HistorySnapshot::default()),
                mounted: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                fetch_gate: tokio::sync::Mutex::new(()),
            }),
            subscription: None,
            worker: None,
        })
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        self.shared.snapshot().clone()
    }

    pub fn phase(&self) -> CyclePhase {
        self.shared.snapshot().phase
    }

    pub fn presence(&self) -> HistoryPresence {
        self.shared.snapshot().presence
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.load(Ordering::SeqCst)
    }

    pub fn wallet(&self) -> &WalletIdentity {
        &self.wallet
    }

    /// Handle of the current cycle worker, if mounted.
    pub fn worker(&self) -> Option<&JoinHandle<()>> {
        self.worker.as_ref()
    }

    fn mount(&mut self) -> Result<(), SchedulerError> {
        if self.is_mounted() {
            log::debug!("[HISTORY] already mounted");
            return Ok(());
        }

        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.mounted.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel();
        self.subscription = Some(self.scheduler.subscribe(move |ev: &PollTickEvent| {
            if ev.task == TaskKind::History {
                let _ = tx.send(*ev);
            }
        }));

        // The timer is armed before the worker exists, so the worker's first
        // stop always finds it running.
        if let Err(e) = self.scheduler.start(TaskKind::History) {
            self.shared.mounted.store(false, Ordering::SeqCst);
            if let Some(id) = self.subscription.take() {
                self.scheduler.unsubscribe(id);
            }
            return Err(e);
        }

        let worker = CycleWorker {
            scheduler: self.scheduler.clone(),
            client: self.client.clone(),
            sink: self.sink.clone(),
            wallet: self.wallet.clone(),
            config: self.config.clone(),
            shared: self.shared.clone(),
            epoch,
        };
        self.shared.snapshot().phase = CyclePhase::Running;
        self.worker = Some(tokio::spawn(worker.run(rx)));

        log::info!(
            "[HISTORY] mounted for wallet {} (epoch {})",
            self.wallet.wallet_name,
            epoch
        );
        Ok(())
    }

    fn unmount(&mut self) -> Result<(), SchedulerError> {
        self.shared.mounted.store(false, Ordering::SeqCst);
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(id) = self.subscription.take() {
            self.scheduler.unsubscribe(id);
        }

        // An in-flight fetch is left to finish; the worker exits once its
        // channel closes, so the handle is kept only for inspection.
        {
            let mut snap = self.shared.snapshot();
            if snap.phase != CyclePhase::Fetching {
                snap.phase = CyclePhase::Stopped;
            }
        }

        log::info!("[HISTORY] unmounted for wallet {}", self.wallet.wallet_name);
        self.scheduler.stop(TaskKind::History)
    }
}

impl<C, S> LifecycleSignal for HistoryView<C, S>
where
    C: HistoryFetchClient + 'static,
    S: ErrorSink + 'static,
{
    fn on_mount(&mut self) -> Result<(), SchedulerError> {
        self.mount()
    }

    fn on_unmount(&mut self) -> Result<(), SchedulerError> {
        self.unmount()
    }

    fn current_records(&self) -> Vec<TransactionRecord> {
        self.shared.snapshot().records.clone()
    }

    fn has_records(&self) -> bool {
        self.shared.snapshot().presence == HistoryPresence::Present
    }
}

impl<C, S> Drop for HistoryView<C, S> {
    fn drop(&mut self) {
        if self.shared.mounted.swap(false, Ordering::SeqCst) {
            self.shared.epoch.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = self.subscription.take() {
                self.scheduler.unsubscribe(id);
            }
            let _ = self.scheduler.stop(TaskKind::History);
        }
    }
}

// =====================================================================
// Cycle worker
// =====================================================================

/// Whether the last start/stop transition seen since the fetch began was a stop.
fn stopped_during_fetch(events: &mut UnboundedReceiver<PollTickEvent>) -> bool {
    let mut stopped = false;
    while let Ok(event) = events.try_recv() {
        match event.cause {
            TickCause::Stopped => stopped = true,
            TickCause::Started => stopped = false,
            TickCause::Elapsed => {}
        }
    }
    stopped
}

/// Runs cycles for one mount of a view.
struct CycleWorker<C, S> {
    scheduler: PollingScheduler,
    client: Arc<C>,
    sink: Arc<S>,
    wallet: WalletIdentity,
    config: SyncConfig,
    shared: Arc<Shared>,
    epoch: u64,
}

impl<C, S> CycleWorker<C, S>
where
    C: HistoryFetchClient,
    S: ErrorSink,
{
    async fn run(self, mut events: UnboundedReceiver<PollTickEvent>) {
        if self.config.fetch_on_mount {
            self.cycle(&mut events).await;
        }

        while let Some(event) = events.recv().await {
            if !event.is_tick() {
                self.follow(event);
                continue;
            }

            self.cycle(&mut events).await;

            // Our own restart and ticks queued before the timer was stopped.
            while let Ok(stale) = events.try_recv() {
                log::trace!("[HISTORY] dropping queued {:?}", stale);
            }
        }

        log::debug!("[HISTORY] worker for epoch {} exiting", self.epoch);
    }

    /// Mirrors start/stop calls made outside a cycle in the phase.
    fn follow(&self, event: PollTickEvent) {
        if !self.is_current() {
            return;
        }
        let phase = match event.cause {
            TickCause::Started => CyclePhase::Running,
            TickCause::Stopped => CyclePhase::Stopped,
            TickCause::Elapsed => return,
        };
        self.shared.snapshot().phase = phase;
    }

    fn is_current(&self) -> bool {
        self.shared.mounted.load(Ordering::SeqCst)
            && self.shared.epoch.load(Ordering::SeqCst) == self.epoch
    }

    /// stop → fetch → restart. The restart does not depend on the fetch outcome,
    /// only on whether the task was stopped by someone else in the meantime.
    async fn cycle(&self, events: &mut UnboundedReceiver<PollTickEvent>) {
        if !self.is_current() {
            return;
        }

        let _gate = self.shared.fetch_gate.lock().await;
        if !self.is_current() {
            return;
        }

        if let Err(e) = self.scheduler.stop(TaskKind::History) {
            log::error!("[HISTORY] could not stop before fetch: {}", e);
        }
        // Everything queued so far, our own stop included, predates the fetch.
        while events.try_recv().is_ok() {}
        self.shared.snapshot().phase = CyclePhase::Fetching;

        let outcome = self.fetch().await;
        self.apply(outcome);

        if !self.is_current() {
            log::debug!("[HISTORY] unmounted during fetch, not restarting");
            if !self.shared.mounted.load(Ordering::SeqCst) {
                self.shared.snapshot().phase = CyclePhase::Stopped;
            }
            return;
        }

        if stopped_during_fetch(events) {
            log::info!("[HISTORY] task stopped during fetch, not restarting");
            self.shared.snapshot().phase = CyclePhase::Stopped;
            return;
        }

        self.shared.snapshot().phase = CyclePhase::Running;
        if let Err(e) = self.scheduler.start(TaskKind::History) {
            log::error!("[HISTORY] could not restart after fetch: {}", e);
        }

        // An unmount may have slipped in between the check and the start. A
        // newer mount owns the task by now and has started it itself.
        if !self.shared.mounted.load(Ordering::SeqCst) {
            log::debug!("[HISTORY] unmounted while restarting, stopping again");
            let _ = self.scheduler.stop(TaskKind::History);
            self.shared.snapshot().phase = CyclePhase::Stopped;
        }
    }

    async fn fetch(&self) -> Result<HistoryResponse, FetchError> {
        let request = self
            .client
            .fetch_history(&self.wallet, self.config.skip, self.config.take);

        match self.config.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, request).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(limit)),
            },
            None => request.await,
        }
    }

    /// Success replaces records and presence wholesale; failure leaves both alone.
    fn apply(&self, outcome: Result<HistoryResponse, FetchError>) {
        match outcome {
            Ok(response) => {
                let normalized = normalize(Some(&response));
                log::debug!(
                    "[HISTORY] fetched {} records (present={})",
                    normalized.records.len(),
                    normalized.presence
                );

                let mut snap = self.shared.snapshot();
                snap.records = normalized.records;
                snap.presence = HistoryPresence::from_flag(normalized.presence);
                snap.cycles += 1;
            }
            Err(e) => {
                self.sink.report(&e);

                let mut snap = self.shared.snapshot();
                snap.failures += 1;
                snap.cycles += 1;
            }
        }
    }
}
