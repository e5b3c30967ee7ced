use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::batch::PathWrite;
use crate::db::queries;
use crate::errors::AppResult;
use crate::models::{Booking, BookingDraft, BookingStatus, BookingViews};

/// Fresh booking id. Random v4 UUIDs: unique, no ordering implied.
pub fn create_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn get_by_id(conn: &Connection, booking_id: &str) -> AppResult<Option<Booking>> {
    queries::get_booking_by_id(conn, booking_id)
}

/// Every booking of the user, oldest slot first.
pub fn get_by_user(conn: &Connection, user_id: &str) -> AppResult<Vec<Booking>> {
    let bookings = queries::get_bookings_for_user(conn, user_id)?;
    tracing::debug!(user_id, count = bookings.len(), "loaded user bookings");
    Ok(bookings)
}

/// The next `limit` confirmed bookings dated today or later.
pub fn get_upcoming(
    conn: &Connection,
    user_id: &str,
    limit: usize,
    today: NaiveDate,
) -> AppResult<Vec<Booking>> {
    let today = today.format("%Y-%m-%d").to_string();
    Ok(get_by_user(conn, user_id)?
        .into_iter()
        .filter(|b| is_upcoming(b, &today))
        .take(limit)
        .collect())
}

/// Upcoming: confirmed and not in the past, soonest first. History: the
/// rest, most recent first.
pub fn partition(bookings: Vec<Booking>, today: NaiveDate) -> BookingViews {
    let today = today.format("%Y-%m-%d").to_string();
    let (mut upcoming, mut history): (Vec<_>, Vec<_>) =
        bookings.into_iter().partition(|b| is_upcoming(b, &today));

    upcoming.sort_by(|a, b| (&a.date, &a.start_time).cmp(&(&b.date, &b.start_time)));
    history.sort_by(|a, b| (&b.date, &b.start_time).cmp(&(&a.date, &a.start_time)));

    BookingViews { upcoming, history }
}

fn is_upcoming(booking: &Booking, today: &str) -> bool {
    booking.status == BookingStatus::Confirmed && booking.date.as_str() >= today
}

pub(crate) fn write_booking(draft: BookingDraft) -> PathWrite {
    PathWrite::PutBooking(draft)
}

pub(crate) fn update_status(booking_id: &str, status: BookingStatus) -> PathWrite {
    PathWrite::SetBookingStatus {
        booking_id: booking_id.to_string(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn booking(id: &str, date: &str, start_time: &str, status: BookingStatus) -> Booking {
        Booking {
            id: id.to_string(),
            user_id: "u1".to_string(),
            court_id: "c1".to_string(),
            court_name: "Central".to_string(),
            date: date.to_string(),
            start_time: start_time.to_string(),
            end_time: "00:00".to_string(),
            status,
            total_price: None,
            booked_at: NaiveDateTime::parse_from_str("2024-08-01 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_create_id_is_unique() {
        let a = create_id();
        let b = create_id();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_partition_upcoming_and_history() {
        let bookings = vec![
            booking("old-done", "2024-08-10", "15:00", BookingStatus::Completed),
            booking("next", "2024-08-15", "10:00", BookingStatus::Confirmed),
            booking("cancelled-future", "2024-08-18", "09:00", BookingStatus::Cancelled),
            booking("later", "2024-08-20", "16:00", BookingStatus::Confirmed),
            booking("stale", "2024-08-01", "09:00", BookingStatus::Confirmed),
            booking("today", "2024-08-14", "08:00", BookingStatus::Confirmed),
        ];

        let views = partition(bookings, day("2024-08-14"));
        let upcoming: Vec<_> = views.upcoming.iter().map(|b| b.id.as_str()).collect();
        let history: Vec<_> = views.history.iter().map(|b| b.id.as_str()).collect();

        assert_eq!(upcoming, vec!["today", "next", "later"]);
        assert_eq!(history, vec!["cancelled-future", "old-done", "stale"]);
    }
}
