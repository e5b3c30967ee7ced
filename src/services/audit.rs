use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppResult;
use crate::models::{Booking, BookingStatus, SlotPath};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    /// A confirmed booking whose slot is not booked for it.
    BookingWithoutSlot { booking_id: String, slot: SlotPath },
    /// A booked slot that does not point at a live booking of its owner made
    /// for this very slot.
    SlotWithoutBooking {
        slot: SlotPath,
        booking_id: Option<String>,
    },
}

/// Cross-checks confirmed bookings against booked slots.
pub fn verify_consistency(conn: &Connection) -> AppResult<Vec<Inconsistency>> {
    let mut problems = vec![];

    for booking in queries::get_confirmed_bookings(conn)? {
        let path = SlotPath::new(&booking.court_id, &booking.date, &booking.start_time);
        let held = queries::get_slot(conn, &path)?
            .map(|slot| {
                slot.is_consistent()
                    && slot.booking_id.as_deref() == Some(booking.id.as_str())
                    && slot.owner_user_id.as_deref() == Some(booking.user_id.as_str())
            })
            .unwrap_or(false);
        if !held {
            problems.push(Inconsistency::BookingWithoutSlot {
                booking_id: booking.id,
                slot: path,
            });
        }
    }

    let mut owners: HashMap<String, Option<Booking>> = HashMap::new();
    for (path, slot) in queries::get_booked_slots(conn)? {
        let live = match slot.booking_id.as_deref() {
            Some(booking_id) => {
                if !owners.contains_key(booking_id) {
                    let found = queries::get_booking_by_id(conn, booking_id)?;
                    owners.insert(booking_id.to_string(), found);
                }
                // The booking must be live, owned by the slot's owner, and
                // for exactly this slot.
                matches!(
                    owners.get(booking_id),
                    Some(Some(b))
                        if b.status != BookingStatus::Cancelled
                            && slot.owner_user_id.as_deref() == Some(b.user_id.as_str())
                            && SlotPath::new(&b.court_id, &b.date, &b.start_time) == path
                )
            }
            None => false,
        };
        if !live {
            problems.push(Inconsistency::SlotWithoutBooking {
                slot: path,
                booking_id: slot.booking_id,
            });
        }
    }

    if !problems.is_empty() {
        tracing::warn!(count = problems.len(), "slot/booking inconsistencies found");
    }
    Ok(problems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::batch::{MultiPathWrite, PathWrite, SlotGuard};
    use crate::models::{BookingDraft, NewCourt, ScheduleSlot};

    fn setup_db() -> Connection {
        let mut conn = crate::db::init_db(":memory:").unwrap();
        MultiPathWrite::new()
            .with(PathWrite::PutCourt {
                id: "c1".to_string(),
                court: NewCourt {
                    name: "Central".to_string(),
                    location: String::new(),
                    surface_type: String::new(),
                    hourly_rate: None,
                    image_ref: None,
                    schedules: Default::default(),
                },
            })
            .commit(&mut conn)
            .unwrap();
        conn
    }

    fn put_slot(path: &SlotPath, slot: ScheduleSlot) -> PathWrite {
        PathWrite::PutSlot {
            path: path.clone(),
            slot,
            guard: SlotGuard::None,
        }
    }

    #[test]
    fn test_detects_both_directions() {
        let mut conn = setup_db();
        let path = SlotPath::new("c1", "2024-08-15", "09:00");
        let orphan = SlotPath::new("c1", "2024-08-15", "10:00");

        MultiPathWrite::new()
            .with(PathWrite::PutBooking(BookingDraft {
                id: "b1".to_string(),
                user_id: "u1".to_string(),
                court_id: "c1".to_string(),
                court_name: "Central".to_string(),
                date: "2024-08-15".to_string(),
                start_time: "09:00".to_string(),
                end_time: "10:00".to_string(),
                status: BookingStatus::Confirmed,
                total_price: None,
            }))
            .with(put_slot(&path, ScheduleSlot::available()))
            .with(put_slot(&orphan, ScheduleSlot::booked("u2", "ghost")))
            .commit(&mut conn)
            .unwrap();

        let problems = verify_consistency(&conn).unwrap();
        assert_eq!(
            problems,
            vec![
                Inconsistency::BookingWithoutSlot {
                    booking_id: "b1".to_string(),
                    slot: path,
                },
                Inconsistency::SlotWithoutBooking {
                    slot: orphan,
                    booking_id: Some("ghost".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_second_slot_claiming_same_booking() {
        let mut conn = setup_db();
        let held = SlotPath::new("c1", "2024-08-15", "09:00");
        let stray = SlotPath::new("c1", "2024-08-15", "10:00");

        MultiPathWrite::new()
            .with(PathWrite::PutBooking(BookingDraft {
                id: "b1".to_string(),
                user_id: "u1".to_string(),
                court_id: "c1".to_string(),
                court_name: "Central".to_string(),
                date: "2024-08-15".to_string(),
                start_time: "09:00".to_string(),
                end_time: "10:00".to_string(),
                status: BookingStatus::Confirmed,
                total_price: None,
            }))
            .with(put_slot(&held, ScheduleSlot::booked("u1", "b1")))
            .with(put_slot(&stray, ScheduleSlot::booked("u1", "b1")))
            .commit(&mut conn)
            .unwrap();

        assert_eq!(
            verify_consistency(&conn).unwrap(),
            vec![Inconsistency::SlotWithoutBooking {
                slot: stray,
                booking_id: Some("b1".to_string()),
            }]
        );
    }

    #[test]
    fn test_empty_store_is_consistent() {
        let conn = setup_db();
        assert!(verify_consistency(&conn).unwrap().is_empty());
    }
}
