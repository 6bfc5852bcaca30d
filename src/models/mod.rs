// Record and summary models
pub mod feedback;
pub mod history;
pub mod ride;
pub mod summary;

pub use feedback::Feedback;
pub use history::RideHistoryEvent;
pub use ride::{Ride, RideStatus};
pub use summary::{DriverMonthlySummary, RideView};
