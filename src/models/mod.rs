pub mod booking;
pub mod slot;
pub mod user;

pub use booking::{Booking, BookingPatch, BookingStatus, NewBooking, ServiceKind};
pub use slot::{SlotAvailability, SLOT_LABELS};
pub use user::{Caller, Role, User};
