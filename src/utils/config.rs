// Centralized configuration for the driver dashboard

use std::env;

use chrono::{FixedOffset, Offset, Utc};

use crate::error::{DashboardError, Result};

/// Operating timezone offset in hours (Philippines, UTC+8)
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₱";

pub const DEFAULT_KEY_PATH: &str = "firebase-key.json";

/// Firestore collection names
pub mod collections {
    pub const RIDES: &str = "ride_information";
    pub const RIDE_HISTORY: &str = "ride_history";
    pub const FEEDBACK: &str = "feedback_information";
    pub const ACCOUNTS: &str = "account_information";
    pub const CONTACTS: &str = "contact_information";
}

/// Runtime settings, read from the environment (and `.env` via dotenvy)
#[derive(Debug, Clone)]
pub struct Config {
    pub firebase_key_path: String,
    pub utc_offset: FixedOffset,
    pub currency_symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firebase_key_path: DEFAULT_KEY_PATH.to_string(),
            utc_offset: offset_from_hours(DEFAULT_UTC_OFFSET_HOURS)
                .unwrap_or_else(|| Utc.fix()),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

impl Config {
    /// Load from process environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup("FIREBASE_KEY_PATH").filter(|p| !p.is_empty()) {
            config.firebase_key_path = path;
        }

        if let Some(raw) = lookup("DASHBOARD_UTC_OFFSET_HOURS") {
            let hours: i32 = raw.trim().parse().map_err(|_| {
                DashboardError::Config(format!("DASHBOARD_UTC_OFFSET_HOURS is not a number: {}", raw))
            })?;
            config.utc_offset = offset_from_hours(hours).ok_or_else(|| {
                DashboardError::Config(format!("UTC offset out of range: {}", hours))
            })?;
        }

        if let Some(symbol) = lookup("DASHBOARD_CURRENCY_SYMBOL").filter(|s| !s.is_empty()) {
            config.currency_symbol = symbol;
        }

        Ok(config)
    }
}

fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}
