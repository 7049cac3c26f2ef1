//! Wire shapes for the finance backend.

use crate::error::{AppError, Result};
use crate::models::session::Session;
use crate::models::transaction::Category;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    /// The backend hashes server-side; the field name is its contract.
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTransaction {
    pub user_id: i64,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    User(Session),
    Admin(Session),
    Denied(String),
}

impl LoginResponse {
    pub fn into_outcome(self, username: &str) -> LoginOutcome {
        if self.auth {
            match self.user_id {
                Some(user_id) => LoginOutcome::User(Session::user(user_id, username.to_string())),
                None => LoginOutcome::Denied("Login response did not include a user id".to_string()),
            }
        } else if self.admin {
            LoginOutcome::Admin(Session::admin(username.to_string()))
        } else {
            LoginOutcome::Denied(self.error.unwrap_or_else(|| "Invalid credentials.".to_string()))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl RegisterResponse {
    pub fn into_result(self) -> Result<()> {
        if self.auth {
            Ok(())
        } else {
            Err(AppError::Api(format!(
                "Registration failed: {}",
                self.error.unwrap_or_else(|| "Unknown error".to_string())
            )))
        }
    }
}

/// `{"message": ...}` on success, `{"error": ...}` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ApiReply {
    Message { message: String },
    Error { error: String },
}

impl ApiReply {
    pub fn into_result(self) -> Result<String> {
        match self {
            ApiReply::Message { message } => Ok(message),
            ApiReply::Error { error } => Err(AppError::Api(error)),
        }
    }
}

/// Admin view of the backend tables, as served by `/output`: column labels
/// and row values keyed by table name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverviewResponse {
    #[serde(default)]
    pub labels: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub values: BTreeMap<String, Vec<Vec<Value>>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminOverview {
    pub transactions: Table,
    pub users: Table,
}

impl OverviewResponse {
    pub fn into_overview(mut self) -> Result<AdminOverview> {
        if let Some(error) = self.error {
            return Err(AppError::Api(error));
        }
        let mut table = |name: &str| Table {
            columns: self.labels.remove(name).unwrap_or_default(),
            rows: self.values.remove(name).unwrap_or_default(),
        };
        Ok(AdminOverview {
            transactions: table("transactions"),
            users: table("users"),
        })
    }
}
