// TaraRide driver dashboard
// Monthly performance summaries for drivers, backed by Firestore

pub mod api;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod utils;

pub use error::{DashboardError, Result};
