// Dashboard refresh cycle
// One fetch-then-aggregate pass per filter change; the latest selection wins

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::Rng;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::aggregator::{
    featured_reviews, name_reviewers, overview, summarize, FeaturedReview, RidesOverview,
};
use super::session::DriverSession;
use crate::api::fetcher::RecordFetcher;
use crate::error::Result;
use crate::models::{DriverMonthlySummary, Feedback, Ride, RideHistoryEvent, RideStatus};
use crate::utils::month::MonthWindow;

/// Summary accepted as the current dashboard state
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub generation: u64,
    pub window: MonthWindow,
    pub summary: DriverMonthlySummary,
}

/// Drives refreshes for one dashboard instance
pub struct DashboardController<F: RecordFetcher> {
    fetcher: Arc<F>,
    session: DriverSession,
    generation: AtomicU64,
    latest: RwLock<Option<Published>>,
}

impl<F: RecordFetcher> DashboardController<F> {
    pub fn new(fetcher: Arc<F>, session: DriverSession) -> Self {
        Self {
            fetcher,
            session,
            generation: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    pub fn session(&self) -> &DriverSession {
        &self.session
    }

    /// Currently published summary, if any refresh has completed
    pub async fn latest(&self) -> Option<Published> {
        self.latest.read().await.clone()
    }

    /// Fetch and aggregate for `window`.
    ///
    /// Returns `None` when a newer refresh started while this one was
    /// fetching; the stale result is dropped instead of published.
    /// Fetch failures publish an empty summary.
    pub async fn refresh(&self, window: MonthWindow) -> Option<DriverMonthlySummary> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Refresh #{} for {}", generation, window.label());

        let summary = match self.fetch_snapshot().await {
            Ok((rides, history, feedback)) => {
                summarize(&self.session.uid, &window, &rides, &history, &feedback)
            }
            Err(e) => {
                error!(
                    "Failed to load dashboard for {} ({}): {}",
                    self.session.uid,
                    window.label(),
                    e
                );
                DriverMonthlySummary::empty()
            }
        };

        let mut latest = self.latest.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding superseded refresh #{}", generation);
            return None;
        }

        info!(
            "Dashboard {} {}: {} rides, {} ratings",
            self.session.uid,
            window.label(),
            summary.total_rides,
            summary.rating_count
        );
        *latest = Some(Published {
            generation,
            window,
            summary: summary.clone(),
        });
        Some(summary)
    }

    /// Status-filtered ride list, not scoped to a month.
    /// Fetch failures yield an empty overview.
    pub async fn status_overview(&self, status: RideStatus) -> RidesOverview {
        let rides = match self.fetcher.fetch_rides(&self.session.uid, status).await {
            Ok(rides) => rides,
            Err(e) => {
                error!(
                    "Failed to load {} rides for {}: {}",
                    status.as_str(),
                    self.session.uid,
                    e
                );
                Vec::new()
            }
        };
        overview(rides, self.session.fallback_name())
    }

    /// Random sample of well-rated reviews of this driver's completed rides,
    /// with reviewers named by their contact name. A failed name lookup
    /// leaves that reviewer anonymous.
    pub async fn featured_reviews<R: Rng + ?Sized>(
        &self,
        min_rating: u8,
        limit: usize,
        rng: &mut R,
    ) -> Result<Vec<FeaturedReview>> {
        let rides = self.fetcher.fetch_completed_rides(&self.session.uid).await?;
        let ride_ids: Vec<String> = rides.iter().map(|r| r.id.clone()).collect();
        let feedback = self.fetcher.fetch_feedback_for_rides(&ride_ids).await?;
        let mut reviews = featured_reviews(&feedback, &rides, min_rating, limit, rng);

        let mut names = HashMap::new();
        for review in &reviews {
            if names.contains_key(&review.passenger_id) {
                continue;
            }
            match self.fetcher.fetch_passenger_name(&review.passenger_id).await {
                Ok(Some(name)) => {
                    names.insert(review.passenger_id.clone(), name);
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to look up reviewer name: {}", e),
            }
        }
        name_reviewers(&mut reviews, &names);

        Ok(reviews)
    }

    /// Completed rides first, then history and feedback scoped to them
    async fn fetch_snapshot(&self) -> Result<(Vec<Ride>, Vec<RideHistoryEvent>, Vec<Feedback>)> {
        let rides = self.fetcher.fetch_completed_rides(&self.session.uid).await?;
        if rides.is_empty() {
            return Ok((rides, Vec::new(), Vec::new()));
        }

        let ride_ids: Vec<String> = rides.iter().map(|r| r.id.clone()).collect();
        let (history, feedback) = futures::try_join!(
            self.fetcher.fetch_history_for_rides(&ride_ids),
            self.fetcher.fetch_feedback_for_rides(&ride_ids),
        )?;

        Ok((rides, history, feedback))
    }
}
