pub mod audit;
pub mod bookings;
pub mod court_feed;
pub mod orchestrator;
pub mod schedule;
pub mod sweep;
