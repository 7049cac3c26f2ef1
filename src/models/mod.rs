pub mod analytics;
pub mod session;
pub mod transaction;
