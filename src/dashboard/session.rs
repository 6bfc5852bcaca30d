// Authenticated driver session
// Passed explicitly to the controller instead of read from a global

use tracing::warn;

use crate::api::fetcher::RecordFetcher;
use crate::error::{DashboardError, Result};

pub const DRIVER_ROLE: &str = "driver";

/// Identity of the signed-in driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSession {
    pub uid: String,
    pub email: Option<String>,
}

impl DriverSession {
    /// Name shown when no ride carries a driver name
    pub fn fallback_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.uid)
    }
}

/// Resolve a session for `uid`, requiring an account with the driver role.
/// No uid means nobody is signed in.
pub async fn resolve_session<F: RecordFetcher + ?Sized>(
    fetcher: &F,
    uid: Option<&str>,
    email: Option<&str>,
) -> Result<DriverSession> {
    let uid = uid
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(DashboardError::NoSession)?;

    let role = fetcher.fetch_account_role(uid).await?;
    if role.as_deref() != Some(DRIVER_ROLE) {
        warn!("Account {} denied dashboard access (role {:?})", uid, role);
        return Err(DashboardError::NotADriver {
            uid: uid.to_string(),
            role,
        });
    }

    Ok(DriverSession {
        uid: uid.to_string(),
        email: email.map(|e| e.to_string()),
    })
}
