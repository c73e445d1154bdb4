use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::FetchError;
use crate::history::api::{HistoryFetchClient, WalletIdentity};
use crate::history::types::HistoryResponse;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum MockReply {
    Page(HistoryResponse),
    /// Resolves to `FetchError::Transport`.
    Fail(String),
    /// Resolves to `FetchError::Status`.
    Status(u16),
    /// Never resolves.
    Hang,
}

impl MockReply {
    fn into_result(self) -> Option<Result<HistoryResponse, FetchError>> {
        match self {
            MockReply::Page(page) => Some(Ok(page)),
            MockReply::Fail(msg) => Some(Err(FetchError::Transport(msg))),
            MockReply::Status(status) => Some(Err(FetchError::Status {
                status,
                body: String::new(),
            })),
            MockReply::Hang => None,
        }
    }
}

/// Pure in-memory history client.
///
/// Replies are consumed in order; once the script runs dry the fallback
/// (an absent batch unless configured) is returned for every call.
pub struct MockHistoryClient {
    script: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    latency: Duration,
    requests: Mutex<Vec<(WalletIdentity, u32, u32)>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockHistoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHistoryClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockReply::Page(HistoryResponse::default()),
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// A client that keeps returning a small, fixed wallet history.
    pub fn demo() -> Self {
        let page: HistoryResponse = serde_json::from_value(json!({
            "history": [{
                "accountName": "account 0",
                "transactionsHistory": [
                    { "type": "received", "id": "4f1c0a9d3be2", "amount": 250000000,
                      "confirmedInBlock": 1204, "timestamp": 1700000000 },
                    { "type": "send", "id": "9ab05e11c771", "amount": 100000000, "fee": 10000,
                      "confirmedInBlock": 1210, "timestamp": 1700003600 },
                    { "type": "staked", "id": "c33d7f2a4e08", "amount": 1200000,
                      "confirmedInBlock": 1222, "timestamp": 1700010800 }
                ]
            }]
        }))
        .unwrap_or_default();

        Self::new()
            .with_fallback(MockReply::Page(page))
            .with_latency(Duration::from_millis(150))
    }

    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = reply;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push(&self, reply: MockReply) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    pub fn push_page(&self, page: HistoryResponse) {
        self.push(MockReply::Page(page));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that were ever outstanding at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(WalletIdentity, u32, u32)> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Decrements the in-flight counter even when the fetch future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl HistoryFetchClient for MockHistoryClient {
    async fn fetch_history(
        &self,
        wallet: &WalletIdentity,
        skip: u32,
        take: u32,
    ) -> Result<HistoryResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((wallet.clone(), skip, take));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let reply = self.next_reply();
        log::trace!("[MOCK] fetch_history #{} -> {:?}", self.calls(), reply);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match reply.into_result() {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}
