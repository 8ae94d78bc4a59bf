pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export the core types for external use
pub use models::{
    ActiveDay, ConsultationLocation, FilterOptions, LocationError, LocationType, TimeSlot,
    ValidationOutcome, Weekday,
};
pub use services::{DashboardListing, LocationService};
