pub mod availability;
pub mod booking;
pub mod court;
pub mod slot_time;

pub use availability::{compute_availability, AvailabilitySummary, CourtAvailability};
pub use booking::{Booking, BookingDraft, BookingStatus, BookingViews};
pub use court::{Court, DailySchedule, NewCourt, ScheduleSlot, SlotPath, SlotStatus};
