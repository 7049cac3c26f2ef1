//! Command handlers behind the interactive shell.
//!
//! Handlers take the caller's [`Session`] explicitly and return a result; the
//! shell only prints or renders what comes back.

use crate::api::client::FinanceApi;
use crate::api::schema::{AdminOverview, LoginOutcome};
use crate::error::{AppError, Result};
use crate::models::analytics::{Analysis, RejectedRecord};
use crate::models::session::Session;
use crate::models::transaction::Transaction;
use crate::operations::filter::{TransactionFilter, distinct_types, filter_transactions};
use crate::operations::{add, aggregate, credentials, validate};
use tracing::{info, warn};

pub struct TransactionListing {
    pub transactions: Vec<Transaction>,
    /// Types across all of the user's transactions, before filtering.
    pub type_choices: Vec<String>,
    pub rejected: Vec<RejectedRecord>,
}

fn require_user(session: Option<&Session>) -> Result<i64> {
    match session {
        Some(Session {
            user_id: Some(user_id),
            ..
        }) => Ok(*user_id),
        Some(_) => Err(AppError::Unauthorized(
            "this command needs a regular user session".to_string(),
        )),
        None => Err(AppError::Unauthorized("please log in first".to_string())),
    }
}

fn require_admin(session: Option<&Session>, what: &str) -> Result<()> {
    match session {
        Some(session) if session.is_admin() => Ok(()),
        _ => Err(AppError::Unauthorized(format!("only admins can {}", what))),
    }
}

fn parse_id(input: &str, what: &str) -> Result<i64> {
    match input.trim().parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::Validation(format!(
            "Invalid {} '{}'. Please provide a positive whole number.",
            what,
            input.trim()
        ))),
    }
}

pub fn log_rejections(rejected: &[RejectedRecord]) {
    for rejection in rejected {
        match rejection.id {
            Some(id) => warn!(
                "Skipped transaction {} (record {}): {}",
                id, rejection.index, rejection.reason
            ),
            None => warn!(
                "Skipped record {} without id: {}",
                rejection.index, rejection.reason
            ),
        }
    }
}

pub fn login(api: &dyn FinanceApi, username: &str, password: &str) -> Result<LoginOutcome> {
    let credentials = credentials::login_credentials(username, password)?;
    let outcome = api.login(&credentials)?;
    match &outcome {
        LoginOutcome::User(session) | LoginOutcome::Admin(session) => {
            info!("Logged in as {} ({:?})", session.username, session.role)
        }
        LoginOutcome::Denied(reason) => warn!("Login failed for {}: {}", credentials.username, reason),
    }
    Ok(outcome)
}

pub fn register(api: &dyn FinanceApi, username: &str, password: &str, confirm: &str) -> Result<()> {
    let credentials = credentials::registration_credentials(username, password, confirm)?;
    api.register(&credentials)?;
    info!("Registered account {}", credentials.username);
    Ok(())
}

pub fn list_transactions(
    api: &dyn FinanceApi,
    session: Option<&Session>,
    filter: &TransactionFilter,
) -> Result<TransactionListing> {
    let user_id = require_user(session)?;
    let (accepted, rejected) = validate::partition_records(api.transactions(user_id)?);
    log_rejections(&rejected);

    let type_choices = distinct_types(&accepted)
        .into_iter()
        .map(str::to_string)
        .collect();
    let transactions = filter_transactions(filter, &accepted)
        .into_iter()
        .cloned()
        .collect();
    Ok(TransactionListing {
        transactions,
        type_choices,
        rejected,
    })
}

pub fn add_transaction(api: &dyn FinanceApi, session: Option<&Session>, input: &str) -> Result<String> {
    let user_id = require_user(session)?;
    let transaction = add::create_transaction(user_id, input)?;
    api.add_transaction(&transaction)
}

pub fn delete_transaction(
    api: &dyn FinanceApi,
    session: Option<&Session>,
    transaction_id: &str,
) -> Result<String> {
    let user_id = require_user(session)?;
    let transaction_id = parse_id(transaction_id, "transaction ID")?;
    api.delete_transaction(user_id, transaction_id)
}

pub fn delete_user(api: &dyn FinanceApi, session: Option<&Session>, user_id: &str) -> Result<String> {
    require_admin(session, "delete users")?;
    let user_id = parse_id(user_id, "user ID")?;
    api.delete_user(user_id)
}

pub fn admin_overview(api: &dyn FinanceApi, session: Option<&Session>) -> Result<AdminOverview> {
    require_admin(session, "view the overview")?;
    let overview = api.overview()?;
    info!(
        "Loaded overview: {} transactions, {} users",
        overview.transactions.rows.len(),
        overview.users.rows.len()
    );
    Ok(overview)
}

/// Fetch the session's transactions and aggregate them for the dashboard.
pub fn analytics(api: &dyn FinanceApi, session: Option<&Session>) -> Result<Analysis> {
    let user_id = require_user(session)?;
    let analysis = aggregate::analyze(api.transactions(user_id)?);
    log_rejections(&analysis.rejected);
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::schema::{Credentials, NewTransaction, Table};
    use crate::operations::validate::RawRecord;
    use rust_decimal::Decimal;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeApi {
        records: String,
        added: RefCell<Vec<NewTransaction>>,
        deleted: RefCell<Vec<(i64, i64)>>,
    }

    impl FakeApi {
        fn with_records(records: &str) -> Self {
            Self {
                records: records.to_string(),
                ..Default::default()
            }
        }
    }

    impl FinanceApi for FakeApi {
        fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
            Ok(match credentials.username.as_str() {
                "admin" => LoginOutcome::Admin(Session::admin("admin".to_string())),
                "alice" => LoginOutcome::User(Session::user(7, "alice".to_string())),
                _ => LoginOutcome::Denied("Invalid credentials.".to_string()),
            })
        }

        fn register(&self, _credentials: &Credentials) -> Result<()> {
            Ok(())
        }

        fn transactions(&self, _user_id: i64) -> Result<Vec<RawRecord>> {
            validate::parse_records(&self.records)
        }

        fn add_transaction(&self, transaction: &NewTransaction) -> Result<String> {
            self.added.borrow_mut().push(transaction.clone());
            Ok("Transaction added".to_string())
        }

        fn delete_transaction(&self, user_id: i64, transaction_id: i64) -> Result<String> {
            self.deleted.borrow_mut().push((user_id, transaction_id));
            Ok("Transaction deleted".to_string())
        }

        fn delete_user(&self, user_id: i64) -> Result<String> {
            Ok(format!("User {} deleted", user_id))
        }

        fn overview(&self) -> Result<AdminOverview> {
            Ok(AdminOverview {
                transactions: Table {
                    columns: vec!["id".to_string(), "amount".to_string()],
                    rows: vec![vec![serde_json::json!(1), serde_json::json!(10)]],
                },
                users: Table {
                    columns: vec!["id".to_string(), "username".to_string()],
                    rows: vec![vec![serde_json::json!(7), serde_json::json!("alice")]],
                },
            })
        }
    }

    const RECORDS: &str = r#"[
        [1, "2024-01-05 10:00:00", "income", "Salary", "1000", null],
        [2, "2024-01-05 12:00:00", "expense", "Rent", "400", "January"],
        [3, "2024-01-06 12:00:00", "refund", "Shop", "20", null]
    ]"#;

    fn alice() -> Session {
        Session::user(7, "alice".to_string())
    }

    #[test]
    fn test_login_outcomes() {
        let api = FakeApi::default();
        assert!(matches!(login(&api, "alice", "pw").unwrap(), LoginOutcome::User(_)));
        assert!(matches!(login(&api, "admin", "pw").unwrap(), LoginOutcome::Admin(_)));
        assert!(matches!(login(&api, "bob", "pw").unwrap(), LoginOutcome::Denied(_)));
        assert!(matches!(login(&api, "", "pw"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_analytics_requires_session() {
        let api = FakeApi::with_records(RECORDS);
        assert!(matches!(analytics(&api, None), Err(AppError::Unauthorized(_))));

        let admin = Session::admin("admin".to_string());
        assert!(matches!(analytics(&api, Some(&admin)), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_analytics_aggregates_and_reports_rejections() {
        let api = FakeApi::with_records(RECORDS);
        let session = alice();

        let analysis = analytics(&api, Some(&session)).unwrap();
        assert_eq!(analysis.result.totals.count, 3);
        assert_eq!(analysis.result.totals.net, Decimal::from(600));
        assert_eq!(analysis.rejected_ids(), vec![3]);
    }

    #[test]
    fn test_list_transactions_applies_filter() {
        let api = FakeApi::with_records(RECORDS);
        let session = alice();
        let filter = TransactionFilter::from_args(Some("expense"), None).unwrap();

        let listing = list_transactions(&api, Some(&session), &filter).unwrap();
        assert_eq!(listing.transactions.len(), 1);
        assert_eq!(listing.transactions[0].kind, "Rent");
        assert_eq!(listing.type_choices, vec!["Salary", "Rent"]);
        assert_eq!(listing.rejected.len(), 1);
    }

    #[test]
    fn test_admin_overview_is_admin_only() {
        let api = FakeApi::default();
        let user = alice();
        let admin = Session::admin("admin".to_string());

        assert!(matches!(admin_overview(&api, None), Err(AppError::Unauthorized(_))));
        assert!(matches!(
            admin_overview(&api, Some(&user)),
            Err(AppError::Unauthorized(_))
        ));

        let overview = admin_overview(&api, Some(&admin)).unwrap();
        assert_eq!(overview.users.columns, vec!["id", "username"]);
        assert_eq!(overview.transactions.rows.len(), 1);
    }

    #[test]
    fn test_add_transaction_uses_session_user() {
        let api = FakeApi::default();
        let session = alice();

        let message = add_transaction(&api, Some(&session), "income, Salary, 2500").unwrap();
        assert_eq!(message, "Transaction added");
        let added = api.added.borrow();
        assert_eq!(added[0].user_id, 7);
        assert_eq!(added[0].amount, Decimal::from(2500));
    }

    #[test]
    fn test_add_transaction_validation_happens_before_request() {
        let api = FakeApi::default();
        let session = alice();

        let result = add_transaction(&api, Some(&session), "income, Rent, 10");
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(api.added.borrow().is_empty());
    }

    #[test]
    fn test_delete_transaction_parses_id() {
        let api = FakeApi::default();
        let session = alice();

        delete_transaction(&api, Some(&session), " 42 ").unwrap();
        assert_eq!(api.deleted.borrow().as_slice(), &[(7, 42)]);

        let result = delete_transaction(&api, Some(&session), "0");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_delete_user_is_admin_only() {
        let api = FakeApi::default();
        let user = alice();
        let admin = Session::admin("admin".to_string());

        assert!(matches!(
            delete_user(&api, Some(&user), "3"),
            Err(AppError::Unauthorized(_))
        ));
        assert_eq!(delete_user(&api, Some(&admin), "3").unwrap(), "User 3 deleted");
    }
}
