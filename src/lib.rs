//! Periodic wallet-history synchronization.
//!
//! * [`scheduler`] owns named recurring timers and broadcasts their transitions.
//! * [`history`] turns raw wallet API pages into domain records and runs the
//!   stop → fetch → restart cycle for a hosting view.

pub mod config;
pub mod error;
pub mod history;
pub mod scheduler;

pub use config::SyncConfig;
pub use error::{FetchError, SchedulerError};
pub use history::{HistoryView, LifecycleSignal, WalletIdentity};
pub use scheduler::{PollingScheduler, TaskKind};
