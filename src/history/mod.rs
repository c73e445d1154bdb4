//! Wallet transaction history: wire/domain types, normalization, the wallet
//! API boundary and the view that keeps a page of history fresh.

pub mod api;
pub mod client;
pub mod normalizer;
pub mod runtime;
pub mod types;

pub use api::{ErrorSink, HistoryFetchClient, LifecycleSignal, LogErrorSink, WalletIdentity};
pub use normalizer::{normalize, NormalizedHistory};
pub use runtime::{CyclePhase, HistorySnapshot, HistoryView};
pub use types::{
    HistoryPage, HistoryPresence, HistoryResponse, RawTransactionRecord, TransactionKind,
    TransactionRecord,
};
