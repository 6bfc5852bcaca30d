// Driver performance aggregation
// Joins rides with ride history and feedback over a month window

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::models::summary::empty_distribution;
use crate::models::{DriverMonthlySummary, Feedback, Ride, RideHistoryEvent, RideStatus, RideView};
use crate::utils::formatters::{truncate_chars, two_decimals};
use crate::utils::month::MonthWindow;

/// Number of feedback entries kept in `recent_feedback`
pub const RECENT_FEEDBACK_LIMIT: usize = 3;

/// Reviewer name shown when the passenger's contact name is unknown
pub const ANONYMOUS_PASSENGER: &str = "Anonymous";

/// Build the monthly summary for one driver.
///
/// Rides carry no completion time, so the month is applied through history
/// events: a completed ride qualifies when at least one of its history events
/// falls inside `window`. Passenger counts are then taken over *all* history
/// events of the qualifying rides, including events outside the window.
pub fn summarize(
    driver_id: &str,
    window: &MonthWindow,
    rides: &[Ride],
    history: &[RideHistoryEvent],
    feedback: &[Feedback],
) -> DriverMonthlySummary {
    let completed: HashMap<&str, &Ride> = rides
        .iter()
        .filter(|r| r.driver_id == driver_id && r.status == RideStatus::Completed)
        .map(|r| (r.id.as_str(), r))
        .collect();

    let matched: HashSet<&str> = history
        .iter()
        .filter(|ev| completed.contains_key(ev.ride_id.as_str()))
        .filter(|ev| ev.completed_on.is_some_and(|ts| window.contains(&ts)))
        .map(|ev| ev.ride_id.as_str())
        .collect();

    let mut passenger_counts: HashMap<&str, usize> = HashMap::new();
    for ev in history {
        if matched.contains(ev.ride_id.as_str()) {
            *passenger_counts.entry(ev.ride_id.as_str()).or_insert(0) += 1;
        }
    }

    // Keep input order, and guard against duplicate ride documents
    let mut seen: HashSet<&str> = HashSet::new();
    let filtered: Vec<&Ride> = rides
        .iter()
        .filter(|r| matched.contains(r.id.as_str()) && completed.contains_key(r.id.as_str()))
        .filter(|r| seen.insert(r.id.as_str()))
        .collect();

    if filtered.is_empty() {
        debug!(
            "No rides for driver {} in {}",
            driver_id,
            window.label()
        );
        return DriverMonthlySummary::empty();
    }

    let total_earnings: f64 = filtered.iter().map(|r| r.earnings_or_zero()).sum();

    let rated: Vec<(&Feedback, f64)> = feedback
        .iter()
        .filter(|fb| seen.contains(fb.ride_id.as_str()))
        .filter_map(|fb| fb.valid_rating().map(|rating| (fb, rating)))
        .collect();

    let ratings: Vec<f64> = rated.iter().map(|(_, r)| *r).collect();
    let rating_distribution = distribution(&ratings);

    let mut per_ride: HashMap<&str, Vec<f64>> = HashMap::new();
    for (fb, rating) in &rated {
        per_ride.entry(fb.ride_id.as_str()).or_default().push(*rating);
    }

    let ride_views: Vec<RideView> = filtered
        .iter()
        .map(|ride| RideView {
            ride: (*ride).clone(),
            passenger_count: passenger_counts.get(ride.id.as_str()).copied().unwrap_or(0),
            average_rating: per_ride
                .get(ride.id.as_str())
                .and_then(|rs| mean(rs))
                .map(two_decimals),
        })
        .collect();

    let mut recent: Vec<&Feedback> = rated.iter().map(|(fb, _)| *fb).collect();
    recent.sort_by(|a, b| b.submitted_on.cmp(&a.submitted_on));
    recent.truncate(RECENT_FEEDBACK_LIMIT);

    DriverMonthlySummary {
        total_rides: filtered.len(),
        total_earnings,
        average_earnings: two_decimals(total_earnings / filtered.len() as f64),
        average_rating: mean(&ratings).map(two_decimals),
        rating_count: ratings.len(),
        rating_distribution,
        recent_feedback: recent.into_iter().cloned().collect(),
        rides: ride_views,
    }
}

/// Arithmetic mean, `None` for an empty slice
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Tally ratings into 1..=5 star buckets, rounding half up
fn distribution(ratings: &[f64]) -> BTreeMap<u8, usize> {
    let mut buckets = empty_distribution();
    for rating in ratings {
        let star = rating.round().clamp(1.0, 5.0) as u8;
        *buckets.entry(star).or_insert(0) += 1;
    }
    buckets
}

/// One bar of the earnings-per-ride chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsPoint {
    pub title: String,
    pub earnings: f64,
}

/// Chart series of earnings per ride, titles shortened to 15 characters
pub fn earnings_series(rides: &[Ride]) -> Vec<EarningsPoint> {
    rides
        .iter()
        .map(|ride| EarningsPoint {
            title: ride
                .title
                .as_deref()
                .map(|t| truncate_chars(t, 15))
                .unwrap_or_else(|| "Untitled".to_string()),
            earnings: ride.earnings_or_zero(),
        })
        .collect()
}

/// Ride count per ride type, largest first
pub fn rides_by_type(rides: &[Ride]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for ride in rides {
        let ride_type = ride.ride_type.as_deref().unwrap_or("unknown");
        *counts.entry(ride_type).or_insert(0) += 1;
    }

    let mut entries: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(t, c)| (t.to_string(), c))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

/// Greeting name: the first driver name found on the rides, else the account email
pub fn driver_display_name(rides: &[Ride], fallback: &str) -> String {
    rides
        .iter()
        .find_map(|r| r.driver_name.clone())
        .unwrap_or_else(|| fallback.to_string())
}

/// Rides of one status with their totals and chart data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RidesOverview {
    pub driver_name: String,
    pub rides: Vec<Ride>,
    pub total_earnings: f64,
    /// Two-decimal string, "0.00" when there are no rides
    pub average_earnings: String,
    pub earnings_series: Vec<EarningsPoint>,
    pub rides_by_type: Vec<(String, usize)>,
}

/// Totals for a plain status-filtered ride list (no month window)
pub fn overview(rides: Vec<Ride>, fallback_name: &str) -> RidesOverview {
    let total_earnings: f64 = rides.iter().map(|r| r.earnings_or_zero()).sum();
    let average_earnings = if rides.is_empty() {
        two_decimals(0.0)
    } else {
        two_decimals(total_earnings / rides.len() as f64)
    };

    RidesOverview {
        driver_name: driver_display_name(&rides, fallback_name),
        earnings_series: earnings_series(&rides),
        rides_by_type: rides_by_type(&rides),
        total_earnings,
        average_earnings,
        rides,
    }
}

/// Review shown on the public review carousel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedReview {
    pub ride_title: String,
    /// Account uid, used only to look up `passenger_name`
    #[serde(skip)]
    pub passenger_id: String,
    pub passenger_name: String,
    pub comment: String,
    pub rating: u8,
    pub submitted_on: Option<DateTime<Utc>>,
}

/// Pick a random sample of well-rated, commented reviews.
/// Feedback without a passenger or comment is skipped. Reviewers start out
/// as [`ANONYMOUS_PASSENGER`]; see [`name_reviewers`].
pub fn featured_reviews<R: Rng + ?Sized>(
    feedback: &[Feedback],
    rides: &[Ride],
    min_rating: u8,
    limit: usize,
    rng: &mut R,
) -> Vec<FeaturedReview> {
    let titles: HashMap<&str, &str> = rides
        .iter()
        .filter_map(|r| r.title.as_deref().map(|t| (r.id.as_str(), t)))
        .collect();

    let mut reviews: Vec<FeaturedReview> = feedback
        .iter()
        .filter_map(|fb| {
            let rating = fb.valid_rating()?;
            if rating < f64::from(min_rating) {
                return None;
            }
            Some(FeaturedReview {
                ride_title: titles
                    .get(fb.ride_id.as_str())
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "Ride Info".to_string()),
                passenger_id: fb.passenger_id.clone()?,
                passenger_name: ANONYMOUS_PASSENGER.to_string(),
                comment: fb.comment.clone()?,
                rating: rating.round() as u8,
                submitted_on: fb.submitted_on,
            })
        })
        .collect();

    reviews.shuffle(rng);
    reviews.truncate(limit);
    reviews
}

/// Fill in reviewer names from `names` (passenger uid -> contact name).
/// Reviewers without a non-blank name stay anonymous.
pub fn name_reviewers(reviews: &mut [FeaturedReview], names: &HashMap<String, String>) {
    for review in reviews {
        review.passenger_name = names
            .get(&review.passenger_id)
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_PASSENGER)
            .to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DRIVER: &str = "drv-1";

    fn manila() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn october() -> MonthWindow {
        MonthWindow::new(2026, 9, manila())
    }

    fn in_october(day: u32) -> DateTime<Utc> {
        manila()
            .with_ymd_and_hms(2026, 10, day, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn in_september(day: u32) -> DateTime<Utc> {
        manila()
            .with_ymd_and_hms(2026, 9, day, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ride(id: &str, earnings: f64) -> Ride {
        Ride {
            id: id.to_string(),
            driver_id: DRIVER.to_string(),
            driver_name: None,
            status: RideStatus::Completed,
            title: Some(format!("Ride {}", id)),
            origin: None,
            destination: None,
            earnings: Some(earnings),
            ride_type: None,
        }
    }

    fn event(ride_id: &str, at: DateTime<Utc>) -> RideHistoryEvent {
        RideHistoryEvent {
            ride_id: ride_id.to_string(),
            passenger_id: Some("p".to_string()),
            completed_on: Some(at),
        }
    }

    fn rating(ride_id: &str, value: f64, at: DateTime<Utc>) -> Feedback {
        Feedback {
            ride_id: ride_id.to_string(),
            passenger_id: Some("p".to_string()),
            rating: Some(value),
            comment: Some("ok".to_string()),
            submitted_on: Some(at),
        }
    }

    fn distribution_of(pairs: &[(u8, usize)]) -> BTreeMap<u8, usize> {
        let mut d = empty_distribution();
        for (star, count) in pairs {
            d.insert(*star, *count);
        }
        d
    }

    #[test]
    fn test_scenario_two_rides_in_window() {
        let rides = vec![ride("r1", 100.0), ride("r2", 50.0)];
        let history = vec![event("r1", in_october(3)), event("r2", in_october(5))];
        let feedback = vec![
            rating("r1", 4.0, in_october(3)),
            rating("r1", 5.0, in_october(4)),
            rating("r2", 3.0, in_october(5)),
        ];

        let s = summarize(DRIVER, &october(), &rides, &history, &feedback);
        assert_eq!(s.total_rides, 2);
        assert_eq!(format!("{:.2}", s.total_earnings), "150.00");
        assert_eq!(s.average_earnings, "75.00");
        assert_eq!(s.average_rating.as_deref(), Some("4.00"));
        assert_eq!(s.rating_count, 3);
        assert_eq!(s.rating_distribution, distribution_of(&[(3, 1), (4, 1), (5, 1)]));
        assert_eq!(s.rides[0].average_rating.as_deref(), Some("4.50"));
        assert_eq!(s.rides[1].average_rating.as_deref(), Some("3.00"));
    }

    #[test]
    fn test_scenario_no_rides_this_month() {
        let rides = vec![ride("r1", 100.0)];
        let history = vec![event("r1", in_september(20))];
        let feedback = vec![rating("r1", 5.0, in_september(20))];

        let s = summarize(DRIVER, &october(), &rides, &history, &feedback);
        assert_eq!(s, DriverMonthlySummary::empty());
        assert_eq!(s.total_earnings, 0.0);
        assert_eq!(s.average_earnings, "0.00");
        assert!(s.average_rating.is_none());
        assert!(s.recent_feedback.is_empty());
    }

    #[test]
    fn test_scenario_foreign_feedback_excluded() {
        let rides = vec![ride("r1", 80.0)];
        let history = vec![event("r1", in_october(1))];
        let feedback = vec![
            rating("r1", 4.0, in_october(1)),
            rating("someone-else", 1.0, in_october(2)),
        ];

        let s = summarize(DRIVER, &october(), &rides, &history, &feedback);
        assert_eq!(s.rating_count, 1);
        assert_eq!(s.average_rating.as_deref(), Some("4.00"));
        assert!(s.recent_feedback.iter().all(|fb| fb.ride_id == "r1"));
    }

    #[test]
    fn test_scenario_passenger_count_ignores_window() {
        let rides = vec![ride("r1", 120.0)];
        let history = vec![
            event("r1", in_october(10)),
            event("r1", in_september(30)),
            event("r1", in_october(31) + Duration::days(2)),
        ];

        let s = summarize(DRIVER, &october(), &rides, &history, &[]);
        assert_eq!(s.total_rides, 1);
        assert_eq!(s.rides[0].passenger_count, 3);
    }

    #[test]
    fn test_only_completed_rides_of_driver() {
        let mut other_driver = ride("r2", 500.0);
        other_driver.driver_id = "drv-2".to_string();
        let mut cancelled = ride("r3", 60.0);
        cancelled.status = RideStatus::Cancelled;
        let rides = vec![ride("r1", 10.0), other_driver, cancelled];
        let history = vec![
            event("r1", in_october(2)),
            event("r2", in_october(2)),
            event("r3", in_october(2)),
        ];

        let s = summarize(DRIVER, &october(), &rides, &history, &[]);
        assert_eq!(s.total_rides, 1);
        for view in &s.rides {
            assert_eq!(view.ride.driver_id, DRIVER);
            assert_eq!(view.ride.status, RideStatus::Completed);
        }
    }

    #[test]
    fn test_ride_matched_once_and_missing_earnings() {
        let mut free = ride("r2", 0.0);
        free.earnings = None;
        let rides = vec![ride("r1", 40.0), free];
        let history = vec![
            event("r1", in_october(2)),
            event("r1", in_october(3)),
            event("r2", in_october(4)),
        ];

        let s = summarize(DRIVER, &october(), &rides, &history, &[]);
        assert_eq!(s.total_rides, 2);
        assert_eq!(s.total_earnings, 40.0);
        assert_eq!(s.average_earnings, "20.00");
        assert!(s.average_rating.is_none());
        assert_eq!(s.rides[0].passenger_count, 2);
    }

    #[test]
    fn test_averages_round_half_up() {
        let rides = vec![ride("r1", 150.125)];
        let history = vec![event("r1", in_october(2))];
        let feedback: Vec<Feedback> = [5.0, 5.0, 5.0, 5.0, 5.0, 4.0, 4.0, 4.0]
            .iter()
            .map(|value| rating("r1", *value, in_october(3)))
            .collect();

        let s = summarize(DRIVER, &october(), &rides, &history, &feedback);
        assert_eq!(s.average_rating.as_deref(), Some("4.63"));
        assert_eq!(s.rides[0].average_rating.as_deref(), Some("4.63"));
        assert_eq!(s.average_earnings, "150.13");
    }

    #[test]
    fn test_invalid_ratings_skipped() {
        let rides = vec![ride("r1", 40.0)];
        let history = vec![event("r1", in_october(2))];
        let mut non_numeric = rating("r1", 0.0, in_october(2));
        non_numeric.rating = None;
        let feedback = vec![
            rating("r1", 9.0, in_october(2)),
            rating("r1", 0.0, in_october(2)),
            non_numeric,
            rating("r1", 2.0, in_october(2)),
        ];

        let s = summarize(DRIVER, &october(), &rides, &history, &feedback);
        assert_eq!(s.rating_count, 1);
        assert_eq!(s.average_rating.as_deref(), Some("2.00"));
    }

    #[test]
    fn test_half_ratings_round_up() {
        let rides = vec![ride("r1", 40.0)];
        let history = vec![event("r1", in_october(2))];
        let feedback = vec![
            rating("r1", 4.5, in_october(2)),
            rating("r1", 1.5, in_october(3)),
        ];

        let s = summarize(DRIVER, &october(), &rides, &history, &feedback);
        assert_eq!(s.rating_distribution, distribution_of(&[(2, 1), (5, 1)]));
    }

    #[test]
    fn test_recent_feedback_sorted_and_capped() {
        let rides = vec![ride("r1", 40.0)];
        let history = vec![event("r1", in_october(2))];
        let feedback: Vec<Feedback> = [5, 20, 11, 2, 28]
            .iter()
            .map(|day| rating("r1", 4.0, in_october(*day)))
            .collect();

        let s = summarize(DRIVER, &october(), &rides, &history, &feedback);
        assert_eq!(s.recent_feedback.len(), RECENT_FEEDBACK_LIMIT);
        let times: Vec<_> = s.recent_feedback.iter().map(|f| f.submitted_on).collect();
        assert_eq!(
            times,
            vec![Some(in_october(28)), Some(in_october(20)), Some(in_october(11))]
        );
    }

    #[test]
    fn test_properties_hold() {
        let rides = vec![ride("r1", 33.3), ride("r2", 12.5), ride("r3", 7.0)];
        let history = vec![
            event("r1", in_october(1)),
            event("r2", in_october(15)),
            event("r3", in_september(15)),
        ];
        let feedback = vec![
            rating("r1", 1.0, in_october(1)),
            rating("r2", 5.0, in_october(16)),
            rating("r2", 3.0, in_october(17)),
            rating("r3", 2.0, in_september(16)),
        ];

        let first = summarize(DRIVER, &october(), &rides, &history, &feedback);
        let second = summarize(DRIVER, &october(), &rides, &history, &feedback);
        assert_eq!(first, second);

        let total: usize = first.rating_distribution.values().sum();
        assert_eq!(total, first.rating_count);

        let avg: f64 = first.average_rating.as_deref().unwrap().parse().unwrap();
        assert!((1.0..=5.0).contains(&avg));
        assert!(first.recent_feedback.len() <= RECENT_FEEDBACK_LIMIT);
    }

    #[test]
    fn test_earnings_series_and_types() {
        let mut long = ride("r1", 10.0);
        long.title = Some("Quezon City to Pasay via EDSA".to_string());
        long.ride_type = Some("sedan".to_string());
        let mut untitled = ride("r2", 5.0);
        untitled.title = None;
        let mut suv = ride("r3", 7.0);
        suv.ride_type = Some("sedan".to_string());
        let rides = vec![long, untitled, suv];

        let series = earnings_series(&rides);
        assert_eq!(series[0].title, "Quezon City to ");
        assert_eq!(series[1].title, "Untitled");
        assert_eq!(series[1].earnings, 5.0);

        assert_eq!(
            rides_by_type(&rides),
            vec![("sedan".to_string(), 2), ("unknown".to_string(), 1)]
        );
    }

    #[test]
    fn test_driver_display_name() {
        let mut named = ride("r2", 1.0);
        named.driver_name = Some("Maria".to_string());
        assert_eq!(
            driver_display_name(&[ride("r1", 1.0), named], "maria@example.com"),
            "Maria"
        );
        assert_eq!(driver_display_name(&[], "maria@example.com"), "maria@example.com");
    }

    #[test]
    fn test_overview() {
        let mut named = ride("r1", 90.0);
        named.driver_name = Some("Jose".to_string());
        let o = overview(vec![named, ride("r2", 30.0)], "jose@example.com");
        assert_eq!(o.driver_name, "Jose");
        assert_eq!(o.total_earnings, 120.0);
        assert_eq!(o.average_earnings, "60.00");
        assert_eq!(o.earnings_series.len(), 2);

        let empty = overview(Vec::new(), "jose@example.com");
        assert_eq!(empty.average_earnings, "0.00");
        assert_eq!(empty.driver_name, "jose@example.com");
        assert!(empty.rides_by_type.is_empty());
    }

    #[test]
    fn test_featured_reviews() {
        let rides = vec![ride("r1", 1.0)];
        let mut no_comment = rating("r1", 5.0, in_october(1));
        no_comment.comment = None;
        let feedback = vec![
            rating("r1", 5.0, in_october(1)),
            rating("gone", 4.0, in_october(2)),
            rating("r1", 3.0, in_october(3)),
            no_comment,
        ];

        let mut rng = StdRng::seed_from_u64(7);
        let reviews = featured_reviews(&feedback, &rides, 4, 5, &mut rng);
        assert_eq!(reviews.len(), 2);
        assert!(reviews.iter().all(|r| r.rating >= 4));
        assert!(reviews.iter().any(|r| r.ride_title == "Ride Info"));
        assert!(reviews.iter().any(|r| r.ride_title == "Ride r1"));

        assert!(reviews.iter().all(|r| r.passenger_name == ANONYMOUS_PASSENGER));

        let capped = featured_reviews(&feedback, &rides, 4, 1, &mut rng);
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn test_reviewer_names_hide_uid() {
        let rides = vec![ride("r1", 1.0)];
        let mut known = rating("r1", 5.0, in_october(1));
        known.passenger_id = Some("pax-1".to_string());
        let mut unknown = rating("r1", 4.0, in_october(2));
        unknown.passenger_id = Some("pax-2".to_string());
        let mut blank = rating("r1", 4.0, in_october(3));
        blank.passenger_id = Some("pax-3".to_string());

        let mut rng = StdRng::seed_from_u64(1);
        let mut reviews = featured_reviews(&[known, unknown, blank], &rides, 4, 5, &mut rng);
        let names = HashMap::from([
            ("pax-1".to_string(), "Liza Soberano".to_string()),
            ("pax-3".to_string(), "  ".to_string()),
        ]);
        name_reviewers(&mut reviews, &names);

        let name_of = |uid: &str| {
            reviews
                .iter()
                .find(|r| r.passenger_id == uid)
                .map(|r| r.passenger_name.clone())
        };
        assert_eq!(name_of("pax-1").as_deref(), Some("Liza Soberano"));
        assert_eq!(name_of("pax-2").as_deref(), Some(ANONYMOUS_PASSENGER));
        assert_eq!(name_of("pax-3").as_deref(), Some(ANONYMOUS_PASSENGER));

        let json = serde_json::to_string(&reviews).unwrap();
        assert!(!json.contains("pax-"));
    }
}
