use std::time::Duration;

use thiserror::Error;

use crate::scheduler::TaskKind;

/// Misuse of the scheduler. Not recoverable at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("unknown task: {0:?} is not registered on this scheduler")]
    UnknownTask(TaskKind),

    #[error("task {0:?} cannot be registered with a zero interval")]
    ZeroInterval(TaskKind),
}

/// Anything the history endpoint can fail with.
///
/// The cycle never inspects these; they are handed to an `ErrorSink` as-is.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("wallet API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed history response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("history fetch did not settle within {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}
