// Presentation adapter
// Turns computed summaries into display-ready values

use std::fmt::Write as _;

use serde::Serialize;

use super::aggregator::{FeaturedReview, RidesOverview};
use crate::models::{DriverMonthlySummary, Feedback, Ride, RideStatus, RideView};
use crate::utils::config::Config;
use crate::utils::formatters::{format_currency, format_long_date, format_number, star_bar};
use crate::utils::month::MonthWindow;

pub const NO_RATINGS: &str = "No ratings yet";
pub const NO_RIDES_THIS_MONTH: &str = "No rides found for this month";

/// Input for star rendering: whole stars plus an optional half star
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StarRating {
    pub full: u8,
    pub half: bool,
}

impl StarRating {
    pub fn from_rating(rating: f64) -> Self {
        let rating = rating.clamp(0.0, 5.0);
        Self {
            full: rating.floor() as u8,
            half: rating % 1.0 >= 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideLine {
    pub title: String,
    /// "From A to B" when both ends are known
    pub route: Option<String>,
    pub earnings: String,
    pub passengers: usize,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackLine {
    pub rating: Option<u8>,
    pub stars: String,
    pub comment: String,
    pub date: Option<String>,
}

/// Everything the monthly dashboard displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub period: String,
    pub total_rides: String,
    pub total_earnings: String,
    pub average_earnings: String,
    pub average_rating: String,
    pub stars: Option<StarRating>,
    pub rating_count: usize,
    /// Five stars first
    pub distribution: Vec<(u8, usize)>,
    pub rides: Vec<RideLine>,
    pub recent_feedback: Vec<FeedbackLine>,
    pub empty_message: Option<&'static str>,
}

impl DashboardView {
    pub fn from_summary(summary: &DriverMonthlySummary, window: &MonthWindow, config: &Config) -> Self {
        let symbol = config.currency_symbol.as_str();
        let rating = summary
            .average_rating
            .as_deref()
            .and_then(|r| r.parse::<f64>().ok());

        Self {
            period: window.label(),
            total_rides: format_number(summary.total_rides as i64),
            total_earnings: format_currency(symbol, summary.total_earnings),
            average_earnings: format!("{}{}", symbol, summary.average_earnings),
            average_rating: summary
                .average_rating
                .clone()
                .unwrap_or_else(|| NO_RATINGS.to_string()),
            stars: rating.map(StarRating::from_rating),
            rating_count: summary.rating_count,
            distribution: summary
                .rating_distribution
                .iter()
                .rev()
                .map(|(star, count)| (*star, *count))
                .collect(),
            rides: summary
                .rides
                .iter()
                .map(|view| ride_line(view, symbol))
                .collect(),
            recent_feedback: summary
                .recent_feedback
                .iter()
                .map(|fb| feedback_line(fb, config))
                .collect(),
            empty_message: summary.is_empty().then_some(NO_RIDES_THIS_MONTH),
        }
    }

    /// Plain-text rendering for terminals and logs
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Performance for {}", self.period);
        let _ = writeln!(out, "  Total rides:    {}", self.total_rides);
        let _ = writeln!(out, "  Total earnings: {}", self.total_earnings);
        let _ = writeln!(out, "  Avg. per ride:  {}", self.average_earnings);
        match self.stars {
            Some(stars) => {
                let half = if stars.half { "½" } else { "" };
                let _ = writeln!(
                    out,
                    "  Avg. rating:    {} ({}{} from {} ratings)",
                    self.average_rating,
                    "★".repeat(stars.full as usize),
                    half,
                    self.rating_count
                );
            }
            None => {
                let _ = writeln!(out, "  Avg. rating:    {}", self.average_rating);
            }
        }

        let _ = writeln!(out, "\nRating distribution");
        for (star, count) in &self.distribution {
            let _ = writeln!(out, "  {} star: {}", star, count);
        }

        let _ = writeln!(out, "\nRides");
        if let Some(message) = self.empty_message {
            let _ = writeln!(out, "  {}", message);
        }
        for ride in &self.rides {
            let _ = writeln!(
                out,
                "  - {} | {} | {} passenger(s) | rating {}",
                ride.title, ride.earnings, ride.passengers, ride.rating
            );
            if let Some(route) = &ride.route {
                let _ = writeln!(out, "    {}", route);
            }
        }

        if !self.recent_feedback.is_empty() {
            let _ = writeln!(out, "\nRecent feedback");
            for fb in &self.recent_feedback {
                let date = fb.date.as_deref().unwrap_or("");
                let _ = writeln!(out, "  {} {} {}", fb.stars, date, fb.comment);
            }
        }

        out
    }
}

fn route_of(ride: &Ride) -> Option<String> {
    match (&ride.origin, &ride.destination) {
        (Some(from), Some(to)) => Some(format!("From {} to {}", from, to)),
        _ => None,
    }
}

fn ride_title(ride: &Ride) -> String {
    ride.title
        .clone()
        .unwrap_or_else(|| "Untitled Ride".to_string())
}

fn ride_line(view: &RideView, symbol: &str) -> RideLine {
    RideLine {
        title: ride_title(&view.ride),
        route: route_of(&view.ride),
        earnings: format_currency(symbol, view.ride.earnings_or_zero()),
        passengers: view.passenger_count,
        rating: view
            .average_rating
            .clone()
            .unwrap_or_else(|| NO_RATINGS.to_string()),
    }
}

fn feedback_line(fb: &Feedback, config: &Config) -> FeedbackLine {
    let rating = fb.valid_rating().map(|r| r.round() as u8);
    FeedbackLine {
        rating,
        stars: star_bar(rating.unwrap_or(0)),
        comment: fb.comment.clone().unwrap_or_default(),
        date: fb
            .submitted_on
            .map(|ts| format_long_date(&ts, config.utc_offset)),
    }
}

/// Plain-text rendering of a status-filtered ride list
pub fn render_overview(overview: &RidesOverview, status: RideStatus, config: &Config) -> String {
    let symbol = config.currency_symbol.as_str();
    let mut out = String::new();
    let _ = writeln!(out, "Welcome, {}", overview.driver_name);
    let _ = writeln!(out, "{} rides: {}", status.label(), overview.rides.len());
    let _ = writeln!(
        out,
        "Total earnings: {}",
        format_currency(symbol, overview.total_earnings)
    );
    let _ = writeln!(out, "Avg. per ride: {}{}", symbol, overview.average_earnings);

    if !overview.rides_by_type.is_empty() {
        let _ = writeln!(out, "\nRides by type");
        for (ride_type, count) in &overview.rides_by_type {
            let _ = writeln!(out, "  {}: {}", ride_type, count);
        }
    }

    if !overview.earnings_series.is_empty() {
        let _ = writeln!(out, "\nEarnings per ride");
        for point in &overview.earnings_series {
            let _ = writeln!(out, "  {:<15} {}", point.title, format_currency(symbol, point.earnings));
        }
    }

    let _ = writeln!(out, "\nYour rides");
    for ride in &overview.rides {
        let _ = writeln!(
            out,
            "  - {} ({})",
            ride_title(ride),
            format_currency(symbol, ride.earnings_or_zero())
        );
        if let Some(route) = route_of(ride) {
            let _ = writeln!(out, "    {}", route);
        }
    }

    out
}

/// Plain-text rendering of featured reviews
pub fn render_reviews(reviews: &[FeaturedReview], config: &Config) -> String {
    if reviews.is_empty() {
        return "No reviews available yet.\n".to_string();
    }

    let mut out = String::new();
    for review in reviews {
        let date = review
            .submitted_on
            .map(|ts| format_long_date(&ts, config.utc_offset))
            .unwrap_or_default();
        let _ = writeln!(out, "{} {}", review.ride_title, date);
        let _ = writeln!(out, "  \"{}\"", review.comment);
        let _ = writeln!(out, "  {} {}", review.passenger_name, star_bar(review.rating));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::aggregator::overview;
    use chrono::{FixedOffset, TimeZone, Utc};

    fn window() -> MonthWindow {
        MonthWindow::new(2026, 9, FixedOffset::east_opt(8 * 3600).unwrap())
    }

    fn sample_ride() -> Ride {
        Ride {
            id: "r1".to_string(),
            driver_id: "drv-1".to_string(),
            driver_name: None,
            status: RideStatus::Completed,
            title: Some("Airport run".to_string()),
            origin: Some("Makati".to_string()),
            destination: Some("NAIA".to_string()),
            earnings: Some(150.0),
            ride_type: None,
        }
    }

    #[test]
    fn test_star_rating() {
        assert_eq!(StarRating::from_rating(4.0), StarRating { full: 4, half: false });
        assert_eq!(StarRating::from_rating(4.5), StarRating { full: 4, half: true });
        assert_eq!(StarRating::from_rating(3.49), StarRating { full: 3, half: false });
        assert_eq!(StarRating::from_rating(5.0), StarRating { full: 5, half: false });
    }

    #[test]
    fn test_empty_view() {
        let view = DashboardView::from_summary(&DriverMonthlySummary::empty(), &window(), &Config::default());
        assert_eq!(view.total_rides, "0");
        assert_eq!(view.total_earnings, "₱0.00");
        assert_eq!(view.average_earnings, "₱0.00");
        assert_eq!(view.average_rating, NO_RATINGS);
        assert!(view.stars.is_none());
        assert_eq!(view.empty_message, Some(NO_RIDES_THIS_MONTH));
        assert_eq!(view.distribution, vec![(5, 0), (4, 0), (3, 0), (2, 0), (1, 0)]);

        let text = view.render_text();
        assert!(text.contains("Performance for October 2026"));
        assert!(text.contains(NO_RIDES_THIS_MONTH));
    }

    #[test]
    fn test_populated_view() {
        let mut summary = DriverMonthlySummary::empty();
        summary.total_rides = 1;
        summary.total_earnings = 150.0;
        summary.average_earnings = "150.00".to_string();
        summary.average_rating = Some("4.50".to_string());
        summary.rating_count = 2;
        summary.rides = vec![RideView {
            ride: sample_ride(),
            passenger_count: 2,
            average_rating: Some("4.50".to_string()),
        }];
        summary.recent_feedback = vec![Feedback {
            ride_id: "r1".to_string(),
            passenger_id: Some("p1".to_string()),
            rating: Some(5.0),
            comment: Some("Great driver".to_string()),
            submitted_on: Some(Utc.with_ymd_and_hms(2026, 10, 17, 20, 0, 0).unwrap()),
        }];

        let view = DashboardView::from_summary(&summary, &window(), &Config::default());
        assert_eq!(view.total_earnings, "₱150.00");
        assert_eq!(view.stars, Some(StarRating { full: 4, half: true }));
        assert!(view.empty_message.is_none());
        assert_eq!(view.rides[0].route.as_deref(), Some("From Makati to NAIA"));
        assert_eq!(view.rides[0].passengers, 2);
        assert_eq!(view.recent_feedback[0].date.as_deref(), Some("October 18, 2026"));
        assert_eq!(view.recent_feedback[0].stars, "★★★★★");
    }

    #[test]
    fn test_render_overview_and_reviews() {
        let config = Config::default();
        let o = overview(vec![sample_ride()], "drv@example.com");
        let text = render_overview(&o, RideStatus::Completed, &config);
        assert!(text.contains("Welcome, drv@example.com"));
        assert!(text.contains("Completed rides: 1"));
        assert!(text.contains("unknown: 1"));

        assert_eq!(render_reviews(&[], &config), "No reviews available yet.\n");

        let review = FeaturedReview {
            ride_title: "Airport run".to_string(),
            passenger_id: "pax-77".to_string(),
            passenger_name: "Liza Soberano".to_string(),
            comment: "Great driver".to_string(),
            rating: 5,
            submitted_on: None,
        };
        let text = render_reviews(&[review], &config);
        assert!(text.contains("Liza Soberano ★★★★★"));
        assert!(!text.contains("pax-77"));
    }
}
