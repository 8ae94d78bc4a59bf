use crate::models::{ConsultationLocation, LocationType, ValidationOutcome};
use crate::services::capacity::minutes_since_midnight;

/// Gate a location before submission. Checks run in a fixed order and the
/// first failing rule wins, so the caller surfaces a single message per
/// attempt and later rules are never evaluated.
pub fn validate(location: &ConsultationLocation) -> ValidationOutcome {
    let name = location.location_name.trim();
    if name.is_empty() {
        return ValidationOutcome::fail("Location name is required");
    }
    if name.chars().count() < 3 {
        return ValidationOutcome::fail("Location name must be at least 3 characters");
    }

    let address = location.address.trim();
    if address.is_empty() {
        return ValidationOutcome::fail("Address is required");
    }
    if address.chars().count() < 5 {
        return ValidationOutcome::fail("Address must be at least 5 characters");
    }

    if LocationType::parse(location.location_type.trim()).is_none() {
        return ValidationOutcome::fail("Invalid location type selected");
    }

    let fee = match location.consultation_fee {
        Some(fee) => fee,
        None => return ValidationOutcome::fail("Consultation fee is required"),
    };
    if fee < 0.0 {
        return ValidationOutcome::fail("Consultation fee must be a positive number");
    }

    if !location.active_days.iter().any(|day| day.is_active) {
        return ValidationOutcome::fail("At least one active day is required");
    }

    for day in &location.active_days {
        if day.is_active && day.time_slots.is_empty() {
            return ValidationOutcome::fail(format!(
                "{} is marked active but has no time slots",
                day.day
            ));
        }
    }

    for day in &location.active_days {
        if !day.is_active {
            continue;
        }

        for (index, slot) in day.time_slots.iter().enumerate() {
            let label = format!("{} - Time slot {}", day.day, index + 1);

            if slot.start_time.trim().is_empty() {
                return ValidationOutcome::fail(format!("{}: Start time is required", label));
            }
            if slot.end_time.trim().is_empty() {
                return ValidationOutcome::fail(format!("{}: End time is required", label));
            }

            let start = minutes_since_midnight(&slot.start_time);
            let end = minutes_since_midnight(&slot.end_time);
            let window = match (start, end) {
                (Some(start), Some(end)) if end > start => end - start,
                _ => {
                    return ValidationOutcome::fail(format!(
                        "{}: End time must be after start time",
                        label
                    ))
                }
            };

            if slot.duration_minutes <= 0 {
                return ValidationOutcome::fail(format!(
                    "{}: Slot duration must be greater than 0",
                    label
                ));
            }
            if slot.duration_minutes > window {
                return ValidationOutcome::fail(format!(
                    "{}: Slot duration is too long for the time range",
                    label
                ));
            }
        }
    }

    ValidationOutcome::valid()
}
