// Record fetchers feeding the dashboard aggregator

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::firebase::{FirebaseClient, QueryFilter};
use crate::error::{DashboardError, Result};
use crate::models::ride::string_field;
use crate::models::{Feedback, Ride, RideHistoryEvent, RideStatus};
use crate::utils::config::collections;

/// Firestore caps `IN` filters at 30 values
pub const IN_QUERY_BATCH: usize = 30;

/// Read access to ride, ride-history and feedback records
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// Rides of one driver with the given status
    async fn fetch_rides(&self, driver_id: &str, status: RideStatus) -> Result<Vec<Ride>>;

    /// All completed rides of one driver, unfiltered by date
    async fn fetch_completed_rides(&self, driver_id: &str) -> Result<Vec<Ride>> {
        self.fetch_rides(driver_id, RideStatus::Completed).await
    }

    /// Every history event in the system
    async fn fetch_all_history_events(&self) -> Result<Vec<RideHistoryEvent>>;

    /// Every feedback entry in the system
    async fn fetch_all_feedback(&self) -> Result<Vec<Feedback>>;

    /// History events for a set of rides. Not date-bounded: passenger
    /// counts need every event of a qualifying ride.
    async fn fetch_history_for_rides(&self, ride_ids: &[String]) -> Result<Vec<RideHistoryEvent>> {
        let wanted: HashSet<&str> = ride_ids.iter().map(|s| s.as_str()).collect();
        Ok(self
            .fetch_all_history_events()
            .await?
            .into_iter()
            .filter(|ev| wanted.contains(ev.ride_id.as_str()))
            .collect())
    }

    /// Feedback for a set of rides
    async fn fetch_feedback_for_rides(&self, ride_ids: &[String]) -> Result<Vec<Feedback>> {
        let wanted: HashSet<&str> = ride_ids.iter().map(|s| s.as_str()).collect();
        Ok(self
            .fetch_all_feedback()
            .await?
            .into_iter()
            .filter(|fb| wanted.contains(fb.ride_id.as_str()))
            .collect())
    }

    /// `business_role` of an account, `None` if the account does not exist
    async fn fetch_account_role(&self, uid: &str) -> Result<Option<String>>;

    /// Contact name of a passenger account, `None` when the account, its
    /// contact record or the name is missing
    async fn fetch_passenger_name(&self, passenger_id: &str) -> Result<Option<String>>;
}

/// Fetcher backed by Firestore
#[derive(Debug, Clone)]
pub struct FirestoreFetcher {
    firebase: Arc<FirebaseClient>,
}

impl FirestoreFetcher {
    pub fn new(firebase: Arc<FirebaseClient>) -> Self {
        Self { firebase }
    }

    /// Run one `IN` query per batch of ride ids
    async fn query_by_ride_ids(&self, collection: &str, ride_ids: &[String]) -> Result<Vec<Value>> {
        let mut docs = Vec::new();
        for batch in ride_ids.chunks(IN_QUERY_BATCH) {
            let filter = QueryFilter::string_in("ride_id", batch.iter().cloned());
            let rows = self.firebase.run_query(collection, &[filter]).await?;
            docs.extend(rows.into_iter().map(|(_, data)| data));
        }
        Ok(docs)
    }
}

#[async_trait]
impl RecordFetcher for FirestoreFetcher {
    async fn fetch_rides(&self, driver_id: &str, status: RideStatus) -> Result<Vec<Ride>> {
        let filters = [
            QueryFilter::string_eq("driver_id", driver_id),
            QueryFilter::string_eq("status", status.as_str()),
        ];
        let rows = self.firebase.run_query(collections::RIDES, &filters).await?;
        Ok(parse_rides(rows.iter().map(|(id, data)| (id.as_str(), data))))
    }

    async fn fetch_all_history_events(&self) -> Result<Vec<RideHistoryEvent>> {
        let rows = self.firebase.list_collection(collections::RIDE_HISTORY).await?;
        Ok(parse_history(rows.iter().map(|(_, data)| data)))
    }

    async fn fetch_all_feedback(&self) -> Result<Vec<Feedback>> {
        let rows = self.firebase.list_collection(collections::FEEDBACK).await?;
        Ok(parse_feedback(rows.iter().map(|(_, data)| data)))
    }

    async fn fetch_history_for_rides(&self, ride_ids: &[String]) -> Result<Vec<RideHistoryEvent>> {
        let docs = self
            .query_by_ride_ids(collections::RIDE_HISTORY, ride_ids)
            .await?;
        Ok(parse_history(docs.iter()))
    }

    async fn fetch_feedback_for_rides(&self, ride_ids: &[String]) -> Result<Vec<Feedback>> {
        let docs = self.query_by_ride_ids(collections::FEEDBACK, ride_ids).await?;
        Ok(parse_feedback(docs.iter()))
    }

    async fn fetch_account_role(&self, uid: &str) -> Result<Option<String>> {
        let doc = self.firebase.get_document(collections::ACCOUNTS, uid).await?;
        Ok(doc.map(|d| {
            d.get("business_role")
                .and_then(|r| r.as_str())
                .unwrap_or_default()
                .to_string()
        }))
    }

    async fn fetch_passenger_name(&self, passenger_id: &str) -> Result<Option<String>> {
        let Some(account) = self
            .firebase
            .get_document(collections::ACCOUNTS, passenger_id)
            .await?
        else {
            return Ok(None);
        };
        let Some(contact_id) = string_field(&account, "uuid") else {
            debug!("Account {} has no contact reference", passenger_id);
            return Ok(None);
        };

        let contact = self
            .firebase
            .get_document(collections::CONTACTS, &contact_id)
            .await?;
        Ok(contact.and_then(|c| string_field(&c, "contact_name")))
    }
}

fn parse_rides<'a>(rows: impl Iterator<Item = (&'a str, &'a Value)>) -> Vec<Ride> {
    rows.filter_map(|(id, data)| {
        let ride = Ride::from_document(id, data);
        if ride.is_none() {
            debug!("Skipping malformed ride document {}", id);
        }
        ride
    })
    .collect()
}

fn parse_history<'a>(docs: impl Iterator<Item = &'a Value>) -> Vec<RideHistoryEvent> {
    let (mut kept, mut skipped) = (Vec::new(), 0usize);
    for doc in docs {
        match RideHistoryEvent::from_document(doc) {
            Some(ev) => kept.push(ev),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("Skipped {} malformed ride history documents", skipped);
    }
    kept
}

fn parse_feedback<'a>(docs: impl Iterator<Item = &'a Value>) -> Vec<Feedback> {
    let (mut kept, mut skipped) = (Vec::new(), 0usize);
    for doc in docs {
        match Feedback::from_document(doc) {
            Some(fb) => kept.push(fb),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("Skipped {} malformed feedback documents", skipped);
    }
    kept
}

/// Raw snapshot file layout used by [`MemoryFetcher::from_json`]
#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    rides: Vec<Value>,
    #[serde(default)]
    ride_history: Vec<Value>,
    #[serde(default)]
    feedback: Vec<Value>,
    /// uid -> business_role
    #[serde(default)]
    accounts: HashMap<String, String>,
    /// passenger uid -> contact name
    #[serde(default)]
    contacts: HashMap<String, String>,
}

/// In-memory fetcher over an already loaded snapshot
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    pub rides: Vec<Ride>,
    pub history: Vec<RideHistoryEvent>,
    pub feedback: Vec<Feedback>,
    pub accounts: HashMap<String, String>,
    /// Passenger uid -> contact name
    pub contacts: HashMap<String, String>,
    /// When set, every fetch fails with this message
    pub fail_with: Option<String>,
}

impl MemoryFetcher {
    pub fn new(rides: Vec<Ride>, history: Vec<RideHistoryEvent>, feedback: Vec<Feedback>) -> Self {
        Self {
            rides,
            history,
            feedback,
            ..Default::default()
        }
    }

    /// Fetcher whose every call fails, for exercising fail-closed paths
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_account(mut self, uid: impl Into<String>, role: impl Into<String>) -> Self {
        self.accounts.insert(uid.into(), role.into());
        self
    }

    pub fn with_contact(mut self, uid: impl Into<String>, name: impl Into<String>) -> Self {
        self.contacts.insert(uid.into(), name.into());
        self
    }

    /// Load a JSON export: `{ "rides": [...], "ride_history": [...], "feedback": [...],
    /// "accounts": {...}, "contacts": {...} }`.
    /// Ride documents carry their document id in an `id` field.
    pub fn from_json(raw: &str) -> Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(raw).map_err(|e| DashboardError::Decode(e.to_string()))?;

        let rides = parse_rides(snapshot.rides.iter().filter_map(|doc| {
            doc.get("id")
                .and_then(|id| id.as_str())
                .map(|id| (id, doc))
        }));

        Ok(Self {
            rides,
            history: parse_history(snapshot.ride_history.iter()),
            feedback: parse_feedback(snapshot.feedback.iter()),
            accounts: snapshot.accounts,
            contacts: snapshot.contacts,
            fail_with: None,
        })
    }

    fn check(&self) -> Result<()> {
        match &self.fail_with {
            Some(message) => Err(DashboardError::Fetch(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordFetcher for MemoryFetcher {
    async fn fetch_rides(&self, driver_id: &str, status: RideStatus) -> Result<Vec<Ride>> {
        self.check()?;
        Ok(self
            .rides
            .iter()
            .filter(|r| r.driver_id == driver_id && r.status == status)
            .cloned()
            .collect())
    }

    async fn fetch_all_history_events(&self) -> Result<Vec<RideHistoryEvent>> {
        self.check()?;
        Ok(self.history.clone())
    }

    async fn fetch_all_feedback(&self) -> Result<Vec<Feedback>> {
        self.check()?;
        Ok(self.feedback.clone())
    }

    async fn fetch_account_role(&self, uid: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.accounts.get(uid).cloned())
    }

    async fn fetch_passenger_name(&self, passenger_id: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self
            .contacts
            .get(passenger_id)
            .filter(|name| !name.trim().is_empty())
            .cloned())
    }
}
