use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Date and slot may only move within this many hours of creation; the same
/// window bounds customer cancellation.
pub const EDIT_WINDOW_HOURS: i64 = 24;

pub const NOTES_MIN_CHARS: usize = 10;
pub const NOTES_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub alternate_phone: Option<String>,
    pub service: ServiceKind,
    pub date: NaiveDate,
    pub time: String,
    pub notes: String,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// True while `now` is no more than [`EDIT_WINDOW_HOURS`] past creation.
    /// The boundary itself is still inside the window.
    pub fn within_edit_window(&self, now: NaiveDateTime) -> bool {
        now - self.created_at <= chrono::Duration::hours(EDIT_WINDOW_HOURS)
    }
}

/// Fields the customer submits on the booking form. Contact fields left out
/// are filled from the customer's profile.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub alternate_phone: Option<String>,
    pub service: String,
    pub date: NaiveDate,
    pub time: String,
    pub notes: String,
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub alternate_phone: Option<String>,
    pub service: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Haircut,
    Coloring,
    Facial,
    Manicure,
    Pedicure,
    Massage,
    Makeup,
    Styling,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 8] = [
        ServiceKind::Haircut,
        ServiceKind::Coloring,
        ServiceKind::Facial,
        ServiceKind::Manicure,
        ServiceKind::Pedicure,
        ServiceKind::Massage,
        ServiceKind::Makeup,
        ServiceKind::Styling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Haircut => "haircut",
            ServiceKind::Coloring => "coloring",
            ServiceKind::Facial => "facial",
            ServiceKind::Manicure => "manicure",
            ServiceKind::Pedicure => "pedicure",
            ServiceKind::Massage => "massage",
            ServiceKind::Makeup => "makeup",
            ServiceKind::Styling => "styling",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::Haircut => "Haircut",
            ServiceKind::Coloring => "Hair Coloring",
            ServiceKind::Facial => "Facial",
            ServiceKind::Manicure => "Manicure",
            ServiceKind::Pedicure => "Pedicure",
            ServiceKind::Massage => "Massage",
            ServiceKind::Makeup => "Makeup",
            ServiceKind::Styling => "Hair Styling",
        }
    }

    /// Nominal chair time, used for calendar exports. Every booking still
    /// occupies exactly one slot.
    pub fn duration_minutes(&self) -> i64 {
        match self {
            ServiceKind::Haircut | ServiceKind::Manicure | ServiceKind::Pedicure => 45,
            ServiceKind::Facial | ServiceKind::Massage | ServiceKind::Makeup => 60,
            ServiceKind::Styling => 50,
            ServiceKind::Coloring => 90,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        match (*self, next) {
            (a, b) if a == b => true,
            (Pending, Confirmed) | (Pending, Cancelled) => true,
            (Confirmed, Completed) | (Confirmed, Cancelled) => true,
            _ => false,
        }
    }
}
