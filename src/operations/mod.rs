pub mod add;
pub mod aggregate;
pub mod credentials;
pub mod filter;
pub mod import;
pub mod report;
pub mod validate;
