use chrono::{NaiveTime, Timelike};

/// Parse a wall-clock "HH:MM" value into minutes since midnight.
/// Empty or malformed input yields `None` rather than an error because the
/// value may be mid-entry on the form.
pub fn minutes_since_midnight(value: &str) -> Option<i32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .ok()
        .map(|t| (t.hour() * 60 + t.minute()) as i32)
}

/// Number of bookable appointments that fit between `start_time` and
/// `end_time` at `duration_minutes` per appointment.
///
/// Incomplete or inverted inputs produce 0, not an error: the slot is being
/// edited and settles into a valid state before submission validation runs.
pub fn compute(start_time: &str, end_time: &str, duration_minutes: i32) -> i32 {
    if duration_minutes <= 0 {
        return 0;
    }

    let (start, end) = match (minutes_since_midnight(start_time), minutes_since_midnight(end_time)) {
        (Some(start), Some(end)) => (start, end),
        _ => return 0,
    };

    let total_minutes = end - start;
    if total_minutes <= 0 {
        return 0;
    }

    total_minutes / duration_minutes
}
