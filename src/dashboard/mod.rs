// Driver dashboard pipeline: session, refresh cycle, aggregation, presentation
pub mod aggregator;
pub mod controller;
pub mod presenter;
pub mod session;
