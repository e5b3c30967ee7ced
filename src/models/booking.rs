use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub court_id: String,
    /// Court name when the booking was made; not updated on renames.
    pub court_name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: BookingStatus,
    pub total_price: Option<f64>,
    pub booked_at: NaiveDateTime,
}

/// Fields of a booking before the store assigns `booked_at`.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub id: String,
    pub user_id: String,
    pub court_id: String,
    pub court_name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: BookingStatus,
    pub total_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    #[serde(rename = "Confirmada")]
    Confirmed,
    #[serde(rename = "Completada")]
    Completed,
    #[serde(rename = "Cancelada")]
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "Confirmada",
            BookingStatus::Completed => "Completada",
            BookingStatus::Cancelled => "Cancelada",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Confirmada" => Some(BookingStatus::Confirmed),
            "Completada" => Some(BookingStatus::Completed),
            "Cancelada" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, BookingStatus::Confirmed)
    }
}

/// A user's bookings split the way the "my bookings" view shows them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookingViews {
    pub upcoming: Vec<Booking>,
    pub history: Vec<Booking>,
}
