use crate::models::{ActiveDay, ConsultationLocation, TimeSlot, Weekday};
use crate::services::capacity;

/// A single edit to one field of a time slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotEdit {
    StartTime(String),
    EndTime(String),
    DurationMinutes(i32),
}

/// Build the full weekly template for a location. The result always carries
/// all 7 weekdays in Sunday-first order; days present in `existing` overwrite
/// the inactive/empty defaults, missing days stay at the default.
pub fn initialize(existing: Option<&ConsultationLocation>) -> ConsultationLocation {
    let mut active_days: Vec<ActiveDay> = Weekday::ALL
        .iter()
        .map(|day| ActiveDay::inactive(*day))
        .collect();

    if let Some(existing) = existing {
        for day in &existing.active_days {
            let slot = day.day.index();
            active_days[slot] = day.clone();
            active_days[slot].day = Weekday::ALL[slot];
        }
    }

    match existing {
        Some(existing) => ConsultationLocation {
            active_days,
            ..existing.clone()
        },
        None => ConsultationLocation {
            id: None,
            practitioner_id: None,
            location_name: String::new(),
            address: String::new(),
            location_type: String::new(),
            room_number: None,
            consultation_fee: None,
            active_days,
            is_published: false,
        },
    }
}

/// Flip a day's active flag. Slots are kept when deactivating so an
/// accidental toggle does not lose entered configuration.
pub fn set_day_active(
    mut location: ConsultationLocation,
    day_index: usize,
    active: bool,
) -> ConsultationLocation {
    if let Some(day) = location.active_days.get_mut(day_index) {
        day.is_active = active;
    }
    location
}

/// Append a fresh default slot to a day.
pub fn add_slot(mut location: ConsultationLocation, day_index: usize) -> ConsultationLocation {
    if let Some(day) = location.active_days.get_mut(day_index) {
        day.time_slots.push(TimeSlot::default());
    }
    location
}

/// Apply one field edit to a slot and recompute its derived capacity.
pub fn update_slot_field(
    mut location: ConsultationLocation,
    day_index: usize,
    slot_index: usize,
    edit: SlotEdit,
) -> ConsultationLocation {
    let Some(slot) = location
        .active_days
        .get_mut(day_index)
        .and_then(|day| day.time_slots.get_mut(slot_index))
    else {
        return location;
    };

    match edit {
        SlotEdit::StartTime(value) => slot.start_time = value,
        SlotEdit::EndTime(value) => slot.end_time = value,
        SlotEdit::DurationMinutes(value) => slot.duration_minutes = value,
    }

    slot.capacity = capacity::compute(&slot.start_time, &slot.end_time, slot.duration_minutes);
    location
}

/// Remove a slot, preserving the order of the rest.
pub fn remove_slot(
    mut location: ConsultationLocation,
    day_index: usize,
    slot_index: usize,
) -> ConsultationLocation {
    if let Some(day) = location.active_days.get_mut(day_index) {
        if slot_index < day.time_slots.len() {
            day.time_slots.remove(slot_index);
        }
    }
    location
}
