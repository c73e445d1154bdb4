use async_trait::async_trait;

use crate::error::{FetchError, SchedulerError};
use crate::history::types::{HistoryResponse, TransactionRecord};

pub const DEFAULT_ACCOUNT: &str = "account 0";

/// Which wallet (and account) a history request is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletIdentity {
    pub wallet_name: String,
    pub account_name: String,
}

impl WalletIdentity {
    pub fn new(wallet_name: impl Into<String>) -> Self {
        Self {
            wallet_name: wallet_name.into(),
            account_name: DEFAULT_ACCOUNT.to_string(),
        }
    }

    pub fn with_account(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = account_name.into();
        self
    }
}

/// Minimal wallet API surface used by the history cycle.
///
/// Timeouts, retries and auth are the implementation's business.
#[async_trait]
pub trait HistoryFetchClient: Send + Sync {
    async fn fetch_history(
        &self,
        wallet: &WalletIdentity,
        skip: u32,
        take: u32,
    ) -> Result<HistoryResponse, FetchError>;
}

/// Where failed fetches go. Called once per failed cycle.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &FetchError);
}

/// Default sink: log and carry on.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, error: &FetchError) {
        log::error!("[HISTORY] fetch failed: {}", error);
    }
}

/// What a hosting view drives and reads.
pub trait LifecycleSignal {
    fn on_mount(&mut self) -> Result<(), SchedulerError>;
    fn on_unmount(&mut self) -> Result<(), SchedulerError>;

    /// Records from the most recent successful fetch.
    fn current_records(&self) -> Vec<TransactionRecord>;
    fn has_records(&self) -> bool;
}
