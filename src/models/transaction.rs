use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const INCOME_TYPES: [&str; 4] = ["Salary", "Investment", "Side Hustle", "Other"];
pub const EXPENSE_TYPES: [&str; 5] = ["Fun", "Rent", "Groceries", "EMI", "Other"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Income,
    Expense,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Income, Category::Expense];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Income => "income",
            Category::Expense => "expense",
        }
    }

    /// Sub-labels the backend accepts for this category.
    pub fn allowed_types(self) -> &'static [&'static str] {
        match self {
            Category::Income => &INCOME_TYPES,
            Category::Expense => &EXPENSE_TYPES,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Category::Income),
            "expense" => Ok(Category::Expense),
            other => Err(format!("Unknown category '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<i64>,
    pub timestamp: NaiveDateTime,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
    pub note: Option<String>,
}

impl Transaction {
    pub fn new(
        id: Option<i64>,
        timestamp: NaiveDateTime,
        category: Category,
        kind: String,
        amount: Decimal,
        note: Option<String>,
    ) -> Self {
        Self {
            id,
            timestamp,
            category,
            kind,
            amount,
            note,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Calendar month bucket key, e.g. `2024-03`.
    pub fn month_key(&self) -> String {
        self.timestamp.format("%Y-%m").to_string()
    }
}
