use rusqlite::Connection;

use crate::db::batch::{MultiPathWrite, PathWrite, SlotGuard};
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{slot_time, Court, DailySchedule, NewCourt, ScheduleSlot, SlotPath, SlotStatus};
use crate::state::AppState;

/// Slots of a court on a date. `None` when nothing is scheduled yet, which is
/// a normal state for future dates.
pub fn get_daily_schedule(
    conn: &Connection,
    court_id: &str,
    date: &str,
) -> AppResult<Option<DailySchedule>> {
    slot_time::parse_date(date)?;
    queries::get_daily_schedule(conn, court_id, date)
}

/// Start times still open on `date`, earliest first.
pub fn list_available_slots(conn: &Connection, court_id: &str, date: &str) -> AppResult<Vec<String>> {
    slot_time::parse_date(date)?;
    if !queries::court_exists(conn, court_id)? {
        return Err(AppError::not_found("court", court_id));
    }

    let schedule = queries::get_daily_schedule(conn, court_id, date)?.unwrap_or_default();
    let slots: Vec<String> = schedule
        .into_iter()
        .filter(|(_, slot)| slot.is_available())
        .map(|(start_time, _)| start_time)
        .collect();

    tracing::debug!(court_id, date, free = slots.len(), "listed available slots");
    Ok(slots)
}

pub fn list_courts(conn: &Connection) -> AppResult<Vec<Court>> {
    queries::list_courts(conn)
}

pub fn get_court(conn: &Connection, court_id: &str) -> AppResult<Court> {
    queries::get_court(conn, court_id)?.ok_or_else(|| AppError::not_found("court", court_id))
}

/// Case-insensitive match on name or location. A blank query returns every court.
pub fn find_courts_by_name(conn: &Connection, query: &str) -> AppResult<Vec<Court>> {
    let courts = queries::list_courts(conn)?;
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(courts);
    }

    Ok(courts
        .into_iter()
        .filter(|court| {
            court.name.to_lowercase().contains(&needle)
                || court.location.to_lowercase().contains(&needle)
        })
        .collect())
}

/// Registers a court with its initial schedules. Slots may start out
/// `available`, `maintenance` or any custom status, but never `booked`:
/// bookings only come from the orchestrator.
pub fn add_court(state: &AppState, court: NewCourt) -> AppResult<String> {
    if court.name.trim().is_empty() {
        return Err(AppError::validation("name", court.name));
    }
    if let Some(rate) = court.hourly_rate {
        if !rate.is_finite() || rate < 0.0 {
            return Err(AppError::validation("hourly_rate", rate.to_string()));
        }
    }
    for (date, schedule) in &court.schedules {
        slot_time::parse_date(date)?;
        for (start_time, slot) in schedule {
            // Only starts a booking can use; a 23:00 slot would be listed but never bookable.
            slot_time::end_time(start_time)?;
            if slot.status == SlotStatus::Booked || !slot.is_consistent() {
                return Err(AppError::validation("status", slot.status.as_str()));
            }
        }
    }

    let id = uuid::Uuid::new_v4().to_string();
    {
        let mut conn = state.conn();
        MultiPathWrite::new()
            .with(PathWrite::PutCourt {
                id: id.clone(),
                court,
            })
            .commit(&mut conn)?;
    }

    tracing::info!(court_id = %id, "court added");
    state.notify_courts_changed(&id);
    Ok(id)
}

/// Slot write for a multi-path batch. There is no standalone setter: slot
/// changes always travel with the booking change they belong to.
pub(crate) fn write_slot(path: SlotPath, slot: ScheduleSlot, guard: SlotGuard) -> PathWrite {
    PathWrite::PutSlot { path, slot, guard }
}
