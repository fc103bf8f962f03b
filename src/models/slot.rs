use chrono::NaiveTime;
use serde::Serialize;

/// Bookable slots of a salon day, in display order.
pub const SLOT_LABELS: [&str; 10] = [
    "09:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "01:00 PM", "02:00 PM", "03:00 PM",
    "04:00 PM", "05:00 PM", "06:00 PM",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotAvailability {
    pub slot: &'static str,
    pub available: bool,
}

/// Maps user input such as `"10:00 am"` onto its canonical label.
pub fn canonical_slot(s: &str) -> Option<&'static str> {
    let wanted = s.trim().to_uppercase();
    SLOT_LABELS.iter().copied().find(|label| *label == wanted)
}

pub fn slot_start_time(label: &str) -> Option<NaiveTime> {
    let label = canonical_slot(label)?;
    NaiveTime::parse_from_str(label, "%I:%M %p").ok()
}

pub fn to_human_readable() -> String {
    let first = SLOT_LABELS[0];
    let last = SLOT_LABELS[SLOT_LABELS.len() - 1];
    format!("{first} to {last}, on the hour")
}
