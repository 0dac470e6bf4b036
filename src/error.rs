use thiserror::Error;

/// Reasons a poll tick produced no alerts.
#[derive(Debug, Error, PartialEq)]
pub enum MonitorError {
    #[error("no access token available, authenticate via /login first")]
    AuthMissing,
    #[error("access token rejected and refreshing it did not help")]
    AuthExpired,
    #[error("failed to fetch structures: {0}")]
    Fetch(String),
    #[error("failed to fetch structures: status code {0}")]
    Status(u16),
    #[error("failed to parse structures: {0}")]
    Parse(String),
}
