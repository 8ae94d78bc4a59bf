use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Weekday in the fixed Sunday-first order used by the weekly template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|d| d == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Weekday> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationType {
    Hospital,
    Clinic,
    Chamber,
}

impl LocationType {
    pub fn parse(value: &str) -> Option<LocationType> {
        match value {
            "Hospital" => Some(LocationType::Hospital),
            "Clinic" => Some(LocationType::Clinic),
            "Chamber" => Some(LocationType::Chamber),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LocationType::Hospital => "Hospital",
            LocationType::Clinic => "Clinic",
            LocationType::Chamber => "Chamber",
        }
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A recurring weekly booking window. Times are wall-clock "HH:MM" strings
/// because they pass through mid-edit states where they are empty or partial;
/// `capacity` is derived and never set directly by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub active: bool,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i32,
    pub capacity: i32,
}

impl Default for TimeSlot {
    fn default() -> Self {
        Self {
            active: true,
            start_time: String::new(),
            end_time: String::new(),
            duration_minutes: 15,
            capacity: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveDay {
    pub day: Weekday,
    pub is_active: bool,
    pub time_slots: Vec<TimeSlot>,
}

impl ActiveDay {
    pub fn inactive(day: Weekday) -> Self {
        Self {
            day,
            is_active: false,
            time_slots: Vec::new(),
        }
    }
}

/// A place where a practitioner sees patients, with its own fee, address and
/// weekly opening schedule. `active_days` always holds all 7 weekdays in
/// Sunday-first order, including inactive ones, so the template is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationLocation {
    pub id: Option<Uuid>,
    pub practitioner_id: Option<Uuid>,
    pub location_name: String,
    pub address: String,
    pub location_type: String,
    pub room_number: Option<String>,
    pub consultation_fee: Option<f64>,
    pub active_days: Vec<ActiveDay>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationFilters {
    pub location_type: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TogglePublishRequest {
    pub publish: bool,
}

/// Filter option sets for the dashboard list view, derived from the first
/// successful fetch only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub location_types: Vec<String>,
    pub total_locations: usize,
}

/// Outcome of submission validation. Checks run in a fixed order and stop at
/// the first failure, so `errors` carries at most one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub ok: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self { ok: true, errors: Vec::new() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { ok: false, errors: vec![message.into()] }
    }

    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

// Error types specific to location operations
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("{0}")]
    Validation(String),

    #[error("Consultation location not found")]
    NotFound,

    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}
