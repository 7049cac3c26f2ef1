//! Analytics client for a personal finance tracking backend.
//!
//! The core is [`operations::aggregate`], a pure pipeline that turns a list
//! of transactions into totals, type breakdowns and chart-ready series.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod operations;

pub use error::{AppError, Result};
pub use models::analytics::{Analysis, AnalyticsResult};
pub use models::transaction::{Category, Transaction};
pub use operations::aggregate::{analyze, analyze_json};
