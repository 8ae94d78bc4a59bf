pub mod capacity;
pub mod listing;
pub mod location;
pub mod schedule;
pub mod validation;

pub use listing::{DashboardListing, PublishBackend};
pub use location::LocationService;
