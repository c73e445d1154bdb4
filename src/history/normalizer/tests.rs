use serde_json::json;

use crate::history::normalizer::{classify, normalize, normalize_fee};
use crate::history::types::{
    HistoryPage, HistoryResponse, RawTransactionRecord, TransactionKind, TransactionRecord,
};

// =========================================================================
// Helpers
// =========================================================================

fn response(entries: serde_json::Value) -> HistoryResponse {
    serde_json::from_value(json!({
        "history": [{
            "accountName": "account 0",
            "transactionsHistory": entries,
        }]
    }))
    .unwrap()
}

fn raw(kind: Option<&str>, fee: Option<i64>) -> RawTransactionRecord {
    RawTransactionRecord {
        kind: kind.map(str::to_string),
        id: Some("tx".into()),
        amount: Some(1),
        fee,
        confirmed_in_block: Some(1),
        timestamp: Some(1),
    }
}

fn single_page(records: Vec<RawTransactionRecord>) -> HistoryResponse {
    HistoryResponse {
        history: Some(vec![HistoryPage {
            account_name: None,
            transactions_history: records,
        }]),
    }
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn sent_entry_is_copied_verbatim() {
    let batch = response(json!([{
        "type": "send", "id": "a", "amount": 5, "fee": 1,
        "confirmedInBlock": 10, "timestamp": 100
    }]));

    let out = normalize(Some(&batch));

    assert!(out.presence);
    assert_eq!(out.unrecognized_types, 0);
    assert_eq!(
        out.records,
        vec![TransactionRecord {
            kind: TransactionKind::Sent,
            id: Some("a".into()),
            amount: Some(5),
            fee: 1,
            confirmed_in_block: Some(10),
            timestamp: Some(100),
        }]
    );
}

#[test]
fn staked_entry_without_fee_gets_zero_fee() {
    let batch = response(json!([{
        "type": "staked", "id": "b", "amount": 2,
        "confirmedInBlock": 11, "timestamp": 101
    }]));

    let out = normalize(Some(&batch));

    assert!(out.presence);
    assert_eq!(out.records[0].kind, TransactionKind::Staked);
    assert_eq!(out.records[0].fee, 0);
    assert_eq!(out.records[0].id.as_deref(), Some("b"));
}

#[test]
fn empty_page_has_no_presence() {
    let out = normalize(Some(&response(json!([]))));
    assert!(out.records.is_empty());
    assert!(!out.presence);
}

#[test]
fn absent_batch_and_absent_history_have_no_presence() {
    let none = normalize(None);
    assert!(none.records.is_empty());
    assert!(!none.presence);

    let no_history = normalize(Some(&HistoryResponse { history: None }));
    assert!(!no_history.presence);

    let no_pages = normalize(Some(&HistoryResponse { history: Some(vec![]) }));
    assert!(!no_pages.presence);

    let null_list: HistoryResponse =
        serde_json::from_value(json!({ "history": [{ "transactionsHistory": null }] })).unwrap();
    assert!(!normalize(Some(&null_list)).presence);
}

#[test]
fn only_the_first_page_is_used() {
    let batch = HistoryResponse {
        history: Some(vec![
            HistoryPage {
                account_name: Some("account 0".into()),
                transactions_history: vec![raw(Some("received"), None)],
            },
            HistoryPage {
                account_name: Some("account 1".into()),
                transactions_history: vec![raw(Some("send"), Some(3)); 4],
            },
        ]),
    };

    let out = normalize(Some(&batch));
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].kind, TransactionKind::Received);
}

#[test]
fn insertion_order_is_preserved() {
    let batch = response(json!([
        { "type": "received", "id": "1" },
        { "type": "send", "id": "2" },
        { "type": "staked", "id": "3" },
    ]));

    let ids: Vec<_> = normalize(Some(&batch))
        .records
        .into_iter()
        .map(|r| r.id.unwrap())
        .collect();
    assert_eq!(ids, ["1", "2", "3"]);
}

// =========================================================================
// Fee law
// =========================================================================

#[test]
fn fee_default_law() {
    assert_eq!(normalize_fee(None), 0);
    assert_eq!(normalize_fee(Some(0)), 0);
    for fee in [1, 250, -7, i64::MAX] {
        assert_eq!(normalize_fee(Some(fee)), fee);
    }
}

#[test]
fn explicit_zero_fee_is_indistinguishable_from_missing() {
    // Regression pin: a reported fee of 0 and an absent fee normalize the same.
    let batch = single_page(vec![raw(Some("send"), Some(0)), raw(Some("send"), None)]);
    let out = normalize(Some(&batch));
    assert_eq!(out.records[0], out.records[1]);
    assert_eq!(out.records[0].fee, 0);
}

#[test]
fn malformed_fee_degrades_to_zero() {
    let batch = response(json!([
        { "type": "send", "fee": "not-a-number" },
        { "type": "send", "fee": { "value": 3 } },
        { "type": "send", "fee": "1500" },
    ]));

    let fees: Vec<_> = normalize(Some(&batch)).records.iter().map(|r| r.fee).collect();
    assert_eq!(fees, [0, 0, 1500]);
}

// =========================================================================
// Kind mapping
// =========================================================================

#[test]
fn kind_mapping_is_total() {
    let cases = [
        (Some("send"), TransactionKind::Sent),
        (Some("received"), TransactionKind::Received),
        (Some("staked"), TransactionKind::Staked),
        (Some("sent"), TransactionKind::Unknown),
        (Some("Send"), TransactionKind::Unknown),
        (Some(" staked"), TransactionKind::Unknown),
        (Some(""), TransactionKind::Unknown),
        (Some("mined"), TransactionKind::Unknown),
        (None, TransactionKind::Unknown),
    ];

    for (input, expected) in cases {
        assert_eq!(classify(input), expected, "input {:?}", input);
    }
}

#[test]
fn unrecognized_types_are_kept_and_counted() {
    let batch = response(json!([
        { "type": "coldstake", "id": "x", "amount": 9, "fee": 2 },
        { "id": "y" },
        { "type": 42, "id": "z" },
        { "type": "received", "id": "w" },
    ]));

    let out = normalize(Some(&batch));

    assert!(out.presence);
    assert_eq!(out.records.len(), 4);
    assert_eq!(out.unrecognized_types, 3);
    assert_eq!(out.records[0].kind, TransactionKind::Unknown);
    assert_eq!(out.records[0].fee, 2);
    assert_eq!(out.records[0].amount, Some(9));
}

#[test]
fn non_object_entries_degrade_to_unknown_records() {
    let batch = response(json!(["garbage", 7, null, { "type": "staked", "id": "ok" }]));

    let out = normalize(Some(&batch));

    assert!(out.presence);
    assert_eq!(out.records.len(), 4);
    let first = &out.records[0];
    assert_eq!(first.kind, TransactionKind::Unknown);
    assert_eq!(first.fee, 0);
    assert!(first.id.is_none() && first.amount.is_none());
    assert_eq!(out.records[3].kind, TransactionKind::Staked);
}

#[test]
fn unconfirmed_entry_keeps_missing_block() {
    let batch = response(json!([{ "type": "received", "id": "p", "amount": 3, "timestamp": 5 }]));
    let rec = &normalize(Some(&batch)).records[0];
    assert_eq!(rec.confirmed_in_block, None);
    assert_eq!(rec.timestamp, Some(5));
}

#[test]
fn numeric_id_is_kept_as_text() {
    let batch = response(json!([
        { "type": "send", "id": 42 },
        { "type": "send", "id": "0xab" },
        { "type": "send", "id": ["nope"] },
    ]));

    let ids: Vec<_> = normalize(Some(&batch))
        .records
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, [Some("42".to_string()), Some("0xab".to_string()), None]);
}
