use crate::history::types::{RawTransactionRecord, TransactionKind, TransactionRecord};

/// Exact, case-sensitive mapping of the wallet API `type` field.
///
/// The API says `"send"` for outgoing entries but we expose `Sent`.
pub fn classify(raw_type: Option<&str>) -> TransactionKind {
    match raw_type {
        Some("send") => TransactionKind::Sent,
        Some("received") => TransactionKind::Received,
        Some("staked") => TransactionKind::Staked,
        Some(other) => {
            log::trace!("[NORMALIZE] unrecognized type {:?}", other);
            TransactionKind::Unknown
        }
        None => TransactionKind::Unknown,
    }
}

/// Absent, zero and malformed fees all normalize to 0.
///
/// A reported fee of exactly zero is indistinguishable from a missing one.
pub fn normalize_fee(raw_fee: Option<i64>) -> i64 {
    match raw_fee {
        Some(fee) if fee != 0 => fee,
        _ => 0,
    }
}

pub fn normalize_record(raw: &RawTransactionRecord) -> TransactionRecord {
    TransactionRecord {
        kind: classify(raw.kind.as_deref()),
        id: raw.id.clone(),
        amount: raw.amount,
        fee: normalize_fee(raw.fee),
        confirmed_in_block: raw.confirmed_in_block,
        timestamp: raw.timestamp,
    }
}
