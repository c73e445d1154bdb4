//! Wire and domain types for wallet transaction history.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =====================================================================
// Wire types (as returned by the wallet API)
// =====================================================================

/// Body of `GET /api/wallet/history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Option<Vec<HistoryPage>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    #[serde(default, deserialize_with = "lenient")]
    pub account_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_records")]
    pub transactions_history: Vec<RawTransactionRecord>,
}

/// One unvalidated history entry.
///
/// Every field is optional and decoded leniently: a value of the wrong shape
/// becomes `None` rather than failing the whole page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionRecord {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub amount: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub fee: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub confirmed_in_block: Option<u64>,

    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<i64>,
}

/// Decodes `T` from whatever JSON value is present, falling back to `None`.
///
/// Numeric strings (`"1500"`) are accepted for numeric targets.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }

    if let Ok(v) = serde_json::from_value::<T>(value.clone()) {
        return Ok(Some(v));
    }

    // "1500" for a numeric field
    if let Value::String(s) = &value {
        if let Ok(n) = s.trim().parse::<serde_json::Number>() {
            if let Ok(v) = serde_json::from_value::<T>(Value::Number(n)) {
                return Ok(Some(v));
            }
        }
    }

    log::debug!("[HISTORY] dropping malformed field value {}", value);
    Ok(None)
}

/// Ids are opaque text; a numeric id keeps its decimal form.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Null => Ok(None),
        other => {
            log::debug!("[HISTORY] dropping malformed id {}", other);
            Ok(None)
        }
    }
}

/// `null` becomes an empty list; entries that are not objects become empty records.
fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<RawTransactionRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap_or_default())
        .collect())
}

// =====================================================================
// Domain types
// =====================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Sent,
    Received,
    Staked,
    /// Any type the wallet API reports that we do not classify.
    Unknown,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sent => "sent",
            TransactionKind::Received => "received",
            TransactionKind::Staked => "staked",
            TransactionKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A normalized history entry. `fee` is always concrete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub kind: TransactionKind,
    pub id: Option<String>,
    pub amount: Option<i64>,
    pub fee: i64,
    pub confirmed_in_block: Option<u64>,
    pub timestamp: Option<i64>,
}

/// Whether the current wallet page has any history.
///
/// `Pending` means no fetch has settled successfully yet, which is different
/// from a wallet that has no transactions (`Empty`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPresence {
    #[default]
    Pending,
    Empty,
    Present,
}

impl HistoryPresence {
    pub fn from_flag(present: bool) -> Self {
        if present {
            HistoryPresence::Present
        } else {
            HistoryPresence::Empty
        }
    }
}
