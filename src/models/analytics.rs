use crate::models::transaction::Category;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeAmount {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTypeAmount {
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub category: Category,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub category: Category,
    pub amount: Decimal,
}

/// Everything the presentation layer is allowed to read.
///
/// `type_breakdown` always holds an entry for both categories, even when
/// one of them has no rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsResult {
    pub totals: Totals,
    pub type_breakdown: BTreeMap<Category, Vec<TypeAmount>>,
    pub category_type_breakdown: Vec<CategoryTypeAmount>,
    pub daily_series: Vec<DailyPoint>,
    pub monthly_series: Vec<MonthlyPoint>,
    pub trend_series: Vec<DailyPoint>,
}

impl AnalyticsResult {
    pub fn types_for(&self, category: Category) -> &[TypeAmount] {
        self.type_breakdown
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RejectionReason {
    MissingAmount,
    InvalidAmount(String),
    NegativeAmount,
    AmountOutOfRange(String),
    MissingTimestamp,
    InvalidTimestamp(String),
    UnknownCategory(String),
    MissingType,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MissingAmount => write!(f, "missing amount"),
            RejectionReason::InvalidAmount(raw) => write!(f, "invalid amount '{}'", raw),
            RejectionReason::NegativeAmount => write!(f, "negative amount"),
            RejectionReason::AmountOutOfRange(raw) => write!(f, "amount '{}' out of range", raw),
            RejectionReason::MissingTimestamp => write!(f, "missing timestamp"),
            RejectionReason::InvalidTimestamp(raw) => write!(f, "invalid timestamp '{}'", raw),
            RejectionReason::UnknownCategory(raw) => write!(f, "unknown category '{}'", raw),
            RejectionReason::MissingType => write!(f, "missing type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub id: Option<i64>,
    /// Position of the record in the input collection.
    pub index: usize,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub result: AnalyticsResult,
    pub rejected: Vec<RejectedRecord>,
}

impl Analysis {
    pub fn rejected_ids(&self) -> Vec<i64> {
        self.rejected.iter().filter_map(|r| r.id).collect()
    }
}
