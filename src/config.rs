use clap::Args;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Runtime settings, taken from flags first and the environment second.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct Config {
    /// Base URL of the finance backend
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Log filter, e.g. `info` or `finance_monitor=debug`
    #[arg(long, env = "FINMON_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout", env = "FINMON_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            log_level: "info".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `api_url` without a trailing slash, ready for path joins.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
