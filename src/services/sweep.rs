//! Background completion of elapsed bookings.
//!
//! Runs beside the orchestrator, not through it: a completed booking keeps
//! its slot `booked`, so no slot path is touched.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use tokio::task::JoinHandle;

use crate::db::queries;
use crate::errors::AppResult;
use crate::state::AppState;

/// Marks confirmed bookings whose slot started before `now` as completed.
pub fn complete_elapsed(conn: &Connection, now: NaiveDateTime) -> AppResult<usize> {
    let cutoff = now.format("%Y-%m-%d %H:%M").to_string();
    queries::complete_bookings_before(conn, &cutoff)
}

pub fn spawn_sweeper(state: Arc<AppState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let result = {
                let conn = state.conn();
                complete_elapsed(&conn, Utc::now().naive_utc())
            };
            match result {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "marked elapsed bookings completed"),
                Err(e) => tracing::warn!(error = %e, "completion sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::{BookingStatus, DailySchedule, NewCourt, ScheduleSlot, SlotStatus};
    use crate::services::orchestrator::{self, CancelBooking, CreateBooking};
    use crate::services::{bookings, schedule};
    use crate::state::test_state;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_only_started_confirmed_bookings_complete() {
        let state = test_state();
        let mut schedule_day = DailySchedule::new();
        for hour in ["09:00", "10:00", "11:00"] {
            schedule_day.insert(hour.to_string(), ScheduleSlot::available());
        }
        let mut schedules = BTreeMap::new();
        schedules.insert("2024-08-15".to_string(), schedule_day);
        let court = schedule::add_court(
            &state,
            NewCourt {
                name: "Central".to_string(),
                location: String::new(),
                surface_type: String::new(),
                hourly_rate: None,
                image_ref: None,
                schedules,
            },
        )
        .unwrap();

        let book = |hour: &str| {
            orchestrator::create_booking(
                &state,
                &CreateBooking {
                    court_id: court.clone(),
                    date: "2024-08-15".to_string(),
                    start_time: hour.to_string(),
                    user_id: "U1".to_string(),
                },
            )
            .unwrap()
        };
        let early = book("09:00");
        let cancelled = book("10:00");
        let later = book("11:00");
        orchestrator::cancel_booking(
            &state,
            &CancelBooking {
                booking_id: cancelled.clone(),
                user_id: "U1".to_string(),
                court_id: court.clone(),
                date: "2024-08-15".to_string(),
                start_time: "10:00".to_string(),
            },
        )
        .unwrap();

        let conn = state.conn();
        assert_eq!(complete_elapsed(&conn, at("2024-08-15 10:30")).unwrap(), 1);

        let status = |id: &str| bookings::get_by_id(&conn, id).unwrap().unwrap().status;
        assert_eq!(status(&early), BookingStatus::Completed);
        assert_eq!(status(&cancelled), BookingStatus::Cancelled);
        assert_eq!(status(&later), BookingStatus::Confirmed);

        let day = queries::get_daily_schedule(&conn, &court, "2024-08-15")
            .unwrap()
            .unwrap();
        assert_eq!(day["09:00"].status, SlotStatus::Booked);
        assert!(crate::services::audit::verify_consistency(&conn).unwrap().is_empty());
    }
}
