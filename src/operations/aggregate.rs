//! Transaction aggregation for the analytics dashboard.
//!
//! All functions are pure and deterministic: identical input slices produce
//! identical output, including row order. Sums use `Decimal` throughout and
//! saturate at `Decimal::MAX` instead of overflowing.

use crate::error::Result;
use crate::models::analytics::{
    Analysis, AnalyticsResult, CategoryTypeAmount, DailyPoint, MonthlyPoint, Totals, TypeAmount,
};
use crate::models::transaction::{Category, Transaction};
use crate::operations::validate::{self, RawRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// How expense amounts are presented in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignConvention {
    #[default]
    Unsigned,
    ExpenseNegative,
}

impl SignConvention {
    fn apply(self, category: Category, amount: Decimal) -> Decimal {
        match (self, category) {
            (SignConvention::ExpenseNegative, Category::Expense) => -amount,
            _ => amount,
        }
    }
}

pub fn compute_totals(transactions: &[Transaction]) -> Totals {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;

    for transaction in transactions {
        match transaction.category {
            Category::Income => income = income.saturating_add(transaction.amount),
            Category::Expense => expense = expense.saturating_add(transaction.amount),
        }
    }

    Totals {
        income,
        expense,
        net: income.saturating_sub(expense),
        count: transactions.len(),
    }
}

/// Summed amount per type within each category, largest first.
///
/// Ties keep the order in which the type first appeared in the input.
pub fn breakdown_by_type(transactions: &[Transaction]) -> BTreeMap<Category, Vec<TypeAmount>> {
    let mut breakdown: BTreeMap<Category, Vec<TypeAmount>> =
        Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
    let mut positions: HashMap<(Category, &str), usize> = HashMap::new();

    for transaction in transactions {
        let rows = breakdown.entry(transaction.category).or_default();
        let key = (transaction.category, transaction.kind.as_str());
        match positions.get(&key) {
            Some(&idx) => rows[idx].amount = rows[idx].amount.saturating_add(transaction.amount),
            None => {
                positions.insert(key, rows.len());
                rows.push(TypeAmount {
                    kind: transaction.kind.clone(),
                    amount: transaction.amount,
                });
            }
        }
    }

    // sort_by is stable, so equal amounts stay in first-seen order
    for rows in breakdown.values_mut() {
        rows.sort_by(|a, b| b.amount.cmp(&a.amount));
    }

    breakdown
}

pub fn breakdown_by_category_type(transactions: &[Transaction]) -> Vec<CategoryTypeAmount> {
    flatten_breakdown(&breakdown_by_type(transactions))
}

fn flatten_breakdown(breakdown: &BTreeMap<Category, Vec<TypeAmount>>) -> Vec<CategoryTypeAmount> {
    breakdown
        .iter()
        .flat_map(|(category, rows)| {
            rows.iter().map(move |row| CategoryTypeAmount {
                category: *category,
                kind: row.kind.clone(),
                amount: row.amount,
            })
        })
        .collect()
}

fn sum_by_bucket<K: Ord>(
    transactions: &[Transaction],
    bucket: impl Fn(&Transaction) -> K,
) -> BTreeMap<(K, Category), Decimal> {
    let mut sums = BTreeMap::new();
    for transaction in transactions {
        let sum = sums
            .entry((bucket(transaction), transaction.category))
            .or_insert(Decimal::ZERO);
        *sum = sum.saturating_add(transaction.amount);
    }
    sums
}

fn day_series(transactions: &[Transaction], sign: SignConvention) -> Vec<DailyPoint> {
    sum_by_bucket(transactions, Transaction::date)
        .into_iter()
        .map(|((date, category), amount)| DailyPoint {
            date,
            category,
            amount: sign.apply(category, amount),
        })
        .collect()
}

/// Per day and category, expense sums negated. Days without records for a
/// category are absent.
pub fn daily_series(transactions: &[Transaction]) -> Vec<DailyPoint> {
    day_series(transactions, SignConvention::ExpenseNegative)
}

/// Same as [`daily_series`] but keyed by `YYYY-MM`.
pub fn monthly_series(transactions: &[Transaction]) -> Vec<MonthlyPoint> {
    sum_by_bucket(transactions, Transaction::month_key)
        .into_iter()
        .map(|((month, category), amount)| MonthlyPoint {
            month,
            category,
            amount: SignConvention::ExpenseNegative.apply(category, amount),
        })
        .collect()
}

/// Per-day per-category totals as unsigned magnitudes. Not cumulative.
pub fn trend_series(transactions: &[Transaction]) -> Vec<DailyPoint> {
    day_series(transactions, SignConvention::Unsigned)
}

pub fn trend_series_signed(transactions: &[Transaction], sign: SignConvention) -> Vec<DailyPoint> {
    day_series(transactions, sign)
}

pub fn aggregate(transactions: &[Transaction]) -> AnalyticsResult {
    let type_breakdown = breakdown_by_type(transactions);
    let category_type_breakdown = flatten_breakdown(&type_breakdown);

    AnalyticsResult {
        totals: compute_totals(transactions),
        type_breakdown,
        category_type_breakdown,
        daily_series: daily_series(transactions),
        monthly_series: monthly_series(transactions),
        trend_series: trend_series(transactions),
    }
}

/// Validate raw records and aggregate the accepted ones.
///
/// `totals.count` counts every input record, rejected ones included.
pub fn analyze(records: Vec<RawRecord>) -> Analysis {
    let input_len = records.len();
    let (accepted, rejected) = validate::partition_records(records);

    let mut result = aggregate(&accepted);
    result.totals.count = input_len;

    Analysis { result, rejected }
}

pub fn analyze_json(text: &str) -> Result<Analysis> {
    Ok(analyze(validate::parse_records(text)?))
}

/// Dates between the first and last day of a daily series, inclusive.
pub fn date_span(points: &[DailyPoint]) -> Option<(NaiveDate, NaiveDate)> {
    let first = points.iter().map(|p| p.date).min()?;
    let last = points.iter().map(|p| p.date).max()?;
    Some((first, last))
}
