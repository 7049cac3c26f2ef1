use crate::models::transaction::{Category, Transaction};

/// Filters offered by the transactions view. `None` means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub category: Option<Category>,
    pub kind: Option<String>,
}

impl TransactionFilter {
    /// Parse the `list [category] [type]` arguments; `all` or a missing
    /// argument disables that filter.
    pub fn from_args(category: Option<&str>, kind: Option<&str>) -> Result<Self, String> {
        let category = match category {
            None => None,
            Some(c) if c.eq_ignore_ascii_case("all") => None,
            Some(c) => Some(c.parse::<Category>()?),
        };
        let kind = kind
            .map(str::trim)
            .filter(|k| !k.is_empty() && !k.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        Ok(Self { category, kind })
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(category) = self.category {
            if transaction.category != category {
                return false;
            }
        }
        if let Some(ref kind) = self.kind {
            if !transaction.kind.eq_ignore_ascii_case(kind) {
                return false;
            }
        }
        true
    }
}

pub fn filter_transactions<'a>(
    filter: &TransactionFilter,
    transactions: &'a [Transaction],
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|transaction| filter.matches(transaction))
        .collect()
}

/// Distinct types in first-seen order, for the type filter choices.
pub fn distinct_types(transactions: &[Transaction]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for transaction in transactions {
        if !seen.contains(&transaction.kind.as_str()) {
            seen.push(transaction.kind.as_str());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    // Helper function to create a test transaction
    fn create_test_transaction(id: i64, category: Category, kind: &str) -> Transaction {
        Transaction::new(
            Some(id),
            NaiveDate::from_ymd_opt(2025, 11, 9)
                .expect("Invalid date")
                .and_hms_opt(0, 0, 0)
                .expect("Invalid time"),
            category,
            kind.to_string(),
            Decimal::new(10050, 2),
            None,
        )
    }

    #[test]
    fn test_filter_by_category() {
        let transactions = vec![
            create_test_transaction(1, Category::Income, "Salary"),
            create_test_transaction(2, Category::Expense, "Rent"),
            create_test_transaction(3, Category::Income, "Other"),
        ];
        let filter = TransactionFilter::from_args(Some("income"), None).unwrap();

        let result = filter_transactions(&filter, &transactions);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, Some(1));
        assert_eq!(result[1].id, Some(3));
    }

    #[test]
    fn test_filter_by_type_case_insensitive() {
        let transactions = vec![
            create_test_transaction(1, Category::Income, "Other"),
            create_test_transaction(2, Category::Expense, "other"),
            create_test_transaction(3, Category::Expense, "Fun"),
        ];
        let filter = TransactionFilter::from_args(Some("All"), Some("OTHER")).unwrap();

        let result = filter_transactions(&filter, &transactions);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_filter_all_matches_everything() {
        let transactions = vec![create_test_transaction(1, Category::Income, "Salary")];
        let filter = TransactionFilter::from_args(Some("all"), Some("all")).unwrap();
        assert_eq!(filter, TransactionFilter::default());
        assert_eq!(filter_transactions(&filter, &transactions).len(), 1);
    }

    #[test]
    fn test_filter_unknown_category() {
        assert!(TransactionFilter::from_args(Some("refund"), None).is_err());
    }

    #[test]
    fn test_distinct_types_first_seen_order() {
        let transactions = vec![
            create_test_transaction(1, Category::Expense, "Rent"),
            create_test_transaction(2, Category::Income, "Salary"),
            create_test_transaction(3, Category::Expense, "Rent"),
        ];
        assert_eq!(distinct_types(&transactions), vec!["Rent", "Salary"]);
    }
}
