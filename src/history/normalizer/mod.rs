//! History normalization.
//!
//! This module is the **Functional Core** of history sync:
//! - **Input**: one `HistoryResponse` page as returned by the wallet API (or nothing).
//! - **Output**: `NormalizedHistory`, the domain records plus the presence flag.
//!
//! # Guarantees
//! * **No IO, no async**: callers own fetching and state.
//! * **Infallible**: malformed entries degrade to `Unknown` / default values,
//!   they never abort the batch.
//! * **Wholesale**: every call produces a fresh sequence; nothing is merged
//!   with a previous batch.

mod logic;

#[cfg(test)]
mod tests;

pub use logic::{classify, normalize_fee, normalize_record};

use crate::history::types::{HistoryResponse, TransactionKind, TransactionRecord};

/// Result of normalizing one history page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedHistory {
    pub records: Vec<TransactionRecord>,
    /// At least one record was produced.
    pub presence: bool,
    /// How many entries carried a `type` we do not classify.
    pub unrecognized_types: usize,
}

impl NormalizedHistory {
    fn empty() -> Self {
        Self::default()
    }
}

/// Normalizes the first page of `batch`.
///
/// An absent batch, an absent or empty `history`, and a first page with no
/// entries all yield `(empty, presence = false)`.
pub fn normalize(batch: Option<&HistoryResponse>) -> NormalizedHistory {
    let Some(page) = batch
        .and_then(|b| b.history.as_ref())
        .and_then(|pages| pages.first())
    else {
        log::debug!("[NORMALIZE] no history page");
        return NormalizedHistory::empty();
    };

    if page.transactions_history.is_empty() {
        log::debug!("[NORMALIZE] first page has no entries");
        return NormalizedHistory::empty();
    }

    let records: Vec<TransactionRecord> = page
        .transactions_history
        .iter()
        .map(normalize_record)
        .collect();

    let unrecognized_types = records
        .iter()
        .filter(|r| r.kind == TransactionKind::Unknown)
        .count();

    if unrecognized_types > 0 {
        log::warn!(
            "[NORMALIZE] {} of {} entries have an unrecognized type",
            unrecognized_types,
            records.len()
        );
    }

    log::debug!("[NORMALIZE] {} records", records.len());

    NormalizedHistory {
        presence: !records.is_empty(),
        records,
        unrecognized_types,
    }
}
