// Error types for the dashboard pipeline

use thiserror::Error;

/// Errors raised while resolving a session or fetching dashboard records
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Network, auth or HTTP status failure from Firestore
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Response body could not be decoded
    #[error("malformed response: {0}")]
    Decode(String),

    #[error("no authenticated driver session")]
    NoSession,

    /// Account exists but is not allowed on the driver dashboard
    #[error("account {uid} has role {role:?}, expected driver")]
    NotADriver { uid: String, role: Option<String> },

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        DashboardError::Fetch(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
