//! Boundary between untyped transaction payloads and typed [`Transaction`]s.
//!
//! Records arrive either as JSON objects or as positional rows in the order
//! `[id, timestamp, category, type, amount, note]`. Per-record problems never
//! abort a batch; they come back as [`RejectedRecord`]s.

use crate::error::{AppError, Result};
use crate::models::analytics::{RejectedRecord, RejectionReason};
use crate::models::transaction::{Category, Transaction};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Upper bound (10^15) for a single amount. Anything above it cannot be a
/// real transaction and would put the running sums at risk of overflow.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTransaction {
    pub id: Option<Value>,
    pub timestamp: Option<Value>,
    pub category: Option<Value>,
    pub kind: Option<Value>,
    pub amount: Option<Value>,
    pub note: Option<Value>,
}

impl RawTransaction {
    /// Pick the known fields out of a named record. `date` and `notes` are
    /// accepted as aliases; when both spellings are present the first
    /// non-null one wins.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let field = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| fields.get(*key).filter(|v| !v.is_null()))
                .cloned()
        };
        RawTransaction {
            id: field(&["id"]),
            timestamp: field(&["timestamp", "date"]),
            category: field(&["category"]),
            kind: field(&["type"]),
            amount: field(&["amount"]),
            note: field(&["note", "notes"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Row(Vec<Value>),
    Object(RawTransaction),
}

impl RawRecord {
    pub fn into_raw(self) -> RawTransaction {
        match self {
            RawRecord::Object(raw) => raw,
            RawRecord::Row(columns) => {
                let column = |idx: usize| columns.get(idx).filter(|v| !v.is_null()).cloned();
                RawTransaction {
                    id: column(0),
                    timestamp: column(1),
                    category: column(2),
                    kind: column(3),
                    amount: column(4),
                    note: column(5),
                }
            }
        }
    }
}

impl From<RawTransaction> for RawRecord {
    fn from(raw: RawTransaction) -> Self {
        RawRecord::Object(raw)
    }
}

/// Decode a JSON document into raw records.
///
/// Fails only when the document is not an array of objects or rows.
pub fn parse_records(text: &str) -> Result<Vec<RawRecord>> {
    let document: Value = serde_json::from_str(text)?;
    parse_records_value(document)
}

pub fn parse_records_value(document: Value) -> Result<Vec<RawRecord>> {
    let Value::Array(items) = document else {
        return Err(AppError::MalformedInput(
            "expected a JSON array of transaction records".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Array(columns) => Ok(RawRecord::Row(columns)),
            Value::Object(fields) => Ok(RawRecord::Object(RawTransaction::from_fields(&fields))),
            other => Err(AppError::MalformedInput(format!(
                "record {} is not a transaction record: {}",
                idx, other
            ))),
        })
        .collect()
}

pub fn validate_record(index: usize, raw: &RawTransaction) -> std::result::Result<Transaction, RejectedRecord> {
    let id = raw.id.as_ref().and_then(parse_id);
    let reject = |reason| RejectedRecord { id, index, reason };

    let amount = match raw.amount.as_ref() {
        None => return Err(reject(RejectionReason::MissingAmount)),
        Some(value) => parse_amount(value).map_err(reject)?,
    };
    if amount < Decimal::ZERO {
        return Err(reject(RejectionReason::NegativeAmount));
    }
    if amount > MAX_AMOUNT {
        return Err(reject(RejectionReason::AmountOutOfRange(amount.to_string())));
    }

    let timestamp = match raw.timestamp.as_ref() {
        None => return Err(reject(RejectionReason::MissingTimestamp)),
        Some(value) => parse_timestamp(value).map_err(reject)?,
    };

    let category = match raw.category.as_ref().map(text_of) {
        Some(text) => text
            .parse::<Category>()
            .map_err(|_| reject(RejectionReason::UnknownCategory(text.clone())))?,
        None => return Err(reject(RejectionReason::UnknownCategory(String::new()))),
    };

    let kind = raw
        .kind
        .as_ref()
        .map(text_of)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| reject(RejectionReason::MissingType))?;

    let note = raw
        .note
        .as_ref()
        .map(text_of)
        .filter(|n| !n.trim().is_empty());

    Ok(Transaction::new(id, timestamp, category, kind, amount, note))
}

/// Split raw records into accepted transactions and rejections, keeping
/// input order on both sides.
pub fn partition_records(records: Vec<RawRecord>) -> (Vec<Transaction>, Vec<RejectedRecord>) {
    let mut accepted = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        match validate_record(index, &record.into_raw()) {
            Ok(transaction) => accepted.push(transaction),
            Err(rejection) => rejected.push(rejection),
        }
    }

    (accepted, rejected)
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_amount(value: &Value) -> std::result::Result<Decimal, RejectionReason> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.trim().is_empty() => return Err(RejectionReason::MissingAmount),
        Value::String(s) => s.trim().to_string(),
        other => return Err(RejectionReason::InvalidAmount(other.to_string())),
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| RejectionReason::InvalidAmount(raw))
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

pub fn parse_timestamp_str(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_timestamp(value: &Value) -> std::result::Result<NaiveDateTime, RejectionReason> {
    match value {
        Value::String(s) if s.trim().is_empty() => Err(RejectionReason::MissingTimestamp),
        Value::String(s) => {
            parse_timestamp_str(s).ok_or_else(|| RejectionReason::InvalidTimestamp(s.clone()))
        }
        other => Err(RejectionReason::InvalidTimestamp(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_positional_row() {
        let records = parse_records(
            r#"[[7, "2024-01-05 09:30:00", "income", "Salary", "1000.00", "January"]]"#,
        )
        .unwrap();
        let (accepted, rejected) = partition_records(records);

        assert!(rejected.is_empty());
        assert_eq!(accepted.len(), 1);
        let tx = &accepted[0];
        assert_eq!(tx.id, Some(7));
        assert_eq!(tx.timestamp, ymd_hms(2024, 1, 5, 9, 30, 0));
        assert_eq!(tx.category, Category::Income);
        assert_eq!(tx.kind, "Salary");
        assert_eq!(tx.amount, Decimal::new(100000, 2));
        assert_eq!(tx.note.as_deref(), Some("January"));
    }

    #[test]
    fn test_parse_object_with_aliases() {
        let records = parse_records(
            r#"[{"id": "3", "date": "2024-02-01", "category": "Expense", "type": " Rent ", "amount": 400, "notes": ""}]"#,
        )
        .unwrap();
        let (accepted, rejected) = partition_records(records);

        assert!(rejected.is_empty());
        assert_eq!(accepted[0].id, Some(3));
        assert_eq!(accepted[0].timestamp, ymd_hms(2024, 2, 1, 0, 0, 0));
        assert_eq!(accepted[0].category, Category::Expense);
        assert_eq!(accepted[0].kind, "Rent");
        assert_eq!(accepted[0].amount, Decimal::from(400));
        assert_eq!(accepted[0].note, None);
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(
            parse_timestamp_str("Fri, 05 Jan 2024 10:00:00 GMT"),
            Some(ymd_hms(2024, 1, 5, 10, 0, 0))
        );
        assert_eq!(
            parse_timestamp_str("2024-01-05T10:00:00+02:00"),
            Some(ymd_hms(2024, 1, 5, 8, 0, 0))
        );
        assert_eq!(
            parse_timestamp_str("2024-01-05T10:00:00.250"),
            Some(ymd_hms(2024, 1, 5, 10, 0, 0) + chrono::Duration::milliseconds(250))
        );
        assert_eq!(parse_timestamp_str("05/01/2024"), None);
    }

    #[test]
    fn test_rejections_carry_id_and_reason() {
        let records = parse_records(
            r#"[
                {"id": 1, "timestamp": "2024-01-05", "category": "refund", "type": "Shop", "amount": 20},
                {"id": 2, "timestamp": "2024-01-05", "category": "income", "type": "Salary"},
                {"id": 3, "category": "income", "type": "Salary", "amount": 5},
                {"id": 4, "timestamp": "yesterday", "category": "income", "type": "Salary", "amount": 5},
                {"id": 5, "timestamp": "2024-01-05", "category": "income", "type": "", "amount": 5},
                {"id": 6, "timestamp": "2024-01-05", "category": "expense", "type": "Fun", "amount": "-1"},
                {"id": 7, "timestamp": "2024-01-05", "category": "expense", "type": "Fun", "amount": "abc"}
            ]"#,
        )
        .unwrap();
        let (accepted, rejected) = partition_records(records);

        assert!(accepted.is_empty());
        let reasons: Vec<_> = rejected.iter().map(|r| (r.id, r.reason.clone())).collect();
        assert_eq!(
            reasons,
            vec![
                (Some(1), RejectionReason::UnknownCategory("refund".to_string())),
                (Some(2), RejectionReason::MissingAmount),
                (Some(3), RejectionReason::MissingTimestamp),
                (Some(4), RejectionReason::InvalidTimestamp("yesterday".to_string())),
                (Some(5), RejectionReason::MissingType),
                (Some(6), RejectionReason::NegativeAmount),
                (Some(7), RejectionReason::InvalidAmount("abc".to_string())),
            ]
        );
        assert_eq!(rejected[3].index, 3);
    }

    #[test]
    fn test_null_columns_in_row_count_as_missing() {
        let raw = RawRecord::Row(vec![json!(9), json!("2024-01-05"), json!("income"), json!("Salary"), Value::Null])
            .into_raw();
        let err = validate_record(0, &raw).unwrap_err();
        assert_eq!(err.reason, RejectionReason::MissingAmount);
        assert_eq!(err.id, Some(9));
    }

    #[test]
    fn test_duplicate_aliases_do_not_abort_the_batch() {
        let records = parse_records(
            r#"[
                {"id": 1, "timestamp": "2024-01-05", "category": "income", "type": "Salary", "amount": 10},
                {"id": 2, "timestamp": "2024-01-05", "date": "2024-01-06", "category": "expense",
                 "type": "Fun", "amount": 4, "note": "a", "notes": "b"},
                {"id": 3, "timestamp": null, "date": "2024-01-07", "category": "expense", "type": "Fun", "amount": 1}
            ]"#,
        )
        .unwrap();
        let (accepted, rejected) = partition_records(records);

        assert!(rejected.is_empty());
        assert_eq!(accepted.len(), 3);
        assert_eq!(accepted[1].timestamp, ymd_hms(2024, 1, 5, 0, 0, 0));
        assert_eq!(accepted[1].note.as_deref(), Some("a"));
        assert_eq!(accepted[2].timestamp, ymd_hms(2024, 1, 7, 0, 0, 0));
    }

    #[test]
    fn test_oversized_amount_is_rejected() {
        let raw = RawTransaction {
            timestamp: Some(json!("2024-01-05")),
            category: Some(json!("income")),
            kind: Some(json!("Salary")),
            amount: Some(json!("50000000000000000000000000000")),
            ..Default::default()
        };
        let err = validate_record(4, &raw).unwrap_err();
        assert_eq!(
            err.reason,
            RejectionReason::AmountOutOfRange("50000000000000000000000000000".to_string())
        );

        let at_limit = RawTransaction { amount: Some(json!(MAX_AMOUNT.to_string())), ..raw };
        assert_eq!(validate_record(0, &at_limit).unwrap().amount, MAX_AMOUNT);
    }

    #[test]
    fn test_non_array_document_is_malformed() {
        let result = parse_records(r#"{"error": "User not found"}"#);
        assert!(matches!(result, Err(AppError::MalformedInput(_))));
    }

    #[test]
    fn test_scalar_item_is_malformed() {
        let result = parse_records(r#"[{"id": 1}, 42]"#);
        match result {
            Err(AppError::MalformedInput(msg)) => assert!(msg.contains("record 1")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_amount_keeps_exact_decimal() {
        let raw = RawTransaction {
            timestamp: Some(json!("2024-01-05")),
            category: Some(json!("expense")),
            kind: Some(json!("Groceries")),
            amount: Some(json!(0.1)),
            ..Default::default()
        };
        let tx = validate_record(0, &raw).unwrap();
        assert_eq!(tx.amount, Decimal::new(1, 1));
        assert_eq!(tx.id, None);
    }
}
