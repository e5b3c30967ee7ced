use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::AppResult;
use crate::models::{
    Booking, BookingDraft, BookingStatus, Court, DailySchedule, NewCourt, ScheduleSlot, SlotPath,
    SlotStatus,
};

const BOOKING_COLUMNS: &str = "id, user_id, court_id, court_name, date, start_time, end_time, status, total_price, booked_at";

// ── Courts ──

pub fn insert_court(conn: &Connection, id: &str, court: &NewCourt) -> AppResult<usize> {
    let count = conn.execute(
        "INSERT INTO courts (id, name, location, surface_type, hourly_rate, image_ref)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            court.name,
            court.location,
            court.surface_type,
            court.hourly_rate,
            court.image_ref,
        ],
    )?;
    Ok(count)
}

pub fn list_courts(conn: &Connection) -> AppResult<Vec<Court>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, location, surface_type, hourly_rate, image_ref
         FROM courts ORDER BY name ASC, id ASC",
    )?;
    let rows = stmt.query_map([], parse_court_row)?;

    let mut courts = vec![];
    for row in rows {
        courts.push(row?);
    }

    let mut index: HashMap<String, usize> = HashMap::with_capacity(courts.len());
    for (i, court) in courts.iter().enumerate() {
        index.insert(court.id.clone(), i);
    }

    let mut stmt = conn.prepare(
        "SELECT court_id, date, start_time, status, owner_user_id, booking_id FROM schedule_slots",
    )?;
    let rows = stmt.query_map([], |row| {
        let court_id: String = row.get(0)?;
        let date: String = row.get(1)?;
        let start_time: String = row.get(2)?;
        Ok((court_id, date, start_time, parse_slot_columns(row, 3)?))
    })?;

    for row in rows {
        let (court_id, date, start_time, slot) = row?;
        if let Some(&i) = index.get(&court_id) {
            courts[i]
                .schedules
                .entry(date)
                .or_default()
                .insert(start_time, slot);
        }
    }

    Ok(courts)
}

pub fn get_court(conn: &Connection, id: &str) -> AppResult<Option<Court>> {
    let court = conn
        .query_row(
            "SELECT id, name, location, surface_type, hourly_rate, image_ref FROM courts WHERE id = ?1",
            params![id],
            parse_court_row,
        )
        .optional()?;

    let Some(mut court) = court else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT date, start_time, status, owner_user_id, booking_id
         FROM schedule_slots WHERE court_id = ?1",
    )?;
    let rows = stmt.query_map(params![id], |row| {
        let date: String = row.get(0)?;
        let start_time: String = row.get(1)?;
        Ok((date, start_time, parse_slot_columns(row, 2)?))
    })?;
    for row in rows {
        let (date, start_time, slot) = row?;
        court.schedules.entry(date).or_default().insert(start_time, slot);
    }

    Ok(Some(court))
}

pub fn court_exists(conn: &Connection, id: &str) -> AppResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM courts WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Name and hourly rate of a court, as snapshotted onto new bookings.
pub fn get_court_pricing(conn: &Connection, id: &str) -> AppResult<Option<(String, Option<f64>)>> {
    let pricing = conn
        .query_row(
            "SELECT name, hourly_rate FROM courts WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(pricing)
}

fn parse_court_row(row: &rusqlite::Row) -> rusqlite::Result<Court> {
    Ok(Court {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        surface_type: row.get(3)?,
        hourly_rate: row.get(4)?,
        image_ref: row.get(5)?,
        schedules: BTreeMap::new(),
    })
}

// ── Schedule slots ──

pub fn get_daily_schedule(
    conn: &Connection,
    court_id: &str,
    date: &str,
) -> AppResult<Option<DailySchedule>> {
    let mut stmt = conn.prepare(
        "SELECT start_time, status, owner_user_id, booking_id
         FROM schedule_slots WHERE court_id = ?1 AND date = ?2",
    )?;
    let rows = stmt.query_map(params![court_id, date], |row| {
        let start_time: String = row.get(0)?;
        Ok((start_time, parse_slot_columns(row, 1)?))
    })?;

    let mut schedule = DailySchedule::new();
    for row in rows {
        let (start_time, slot) = row?;
        schedule.insert(start_time, slot);
    }

    Ok(if schedule.is_empty() { None } else { Some(schedule) })
}

pub fn get_slot(conn: &Connection, path: &SlotPath) -> AppResult<Option<ScheduleSlot>> {
    let slot = conn
        .query_row(
            "SELECT status, owner_user_id, booking_id FROM schedule_slots
             WHERE court_id = ?1 AND date = ?2 AND start_time = ?3",
            params![path.court_id, path.date, path.start_time],
            |row| parse_slot_columns(row, 0),
        )
        .optional()?;
    Ok(slot)
}

pub fn upsert_slot(conn: &Connection, path: &SlotPath, slot: &ScheduleSlot) -> AppResult<usize> {
    let count = conn.execute(
        "INSERT INTO schedule_slots (court_id, date, start_time, status, owner_user_id, booking_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(court_id, date, start_time) DO UPDATE SET
           status = excluded.status,
           owner_user_id = excluded.owner_user_id,
           booking_id = excluded.booking_id",
        params![
            path.court_id,
            path.date,
            path.start_time,
            slot.status.as_str(),
            slot.owner_user_id,
            slot.booking_id,
        ],
    )?;
    Ok(count)
}

/// Overwrites the slot only while its status is still `available`.
pub fn update_slot_if_available(
    conn: &Connection,
    path: &SlotPath,
    slot: &ScheduleSlot,
) -> AppResult<usize> {
    let count = conn.execute(
        "UPDATE schedule_slots SET status = ?4, owner_user_id = ?5, booking_id = ?6
         WHERE court_id = ?1 AND date = ?2 AND start_time = ?3 AND status = 'available'",
        params![
            path.court_id,
            path.date,
            path.start_time,
            slot.status.as_str(),
            slot.owner_user_id,
            slot.booking_id,
        ],
    )?;
    Ok(count)
}

/// Overwrites the slot only while it still references `booking_id`.
pub fn update_slot_if_held_by(
    conn: &Connection,
    path: &SlotPath,
    booking_id: &str,
    slot: &ScheduleSlot,
) -> AppResult<usize> {
    let count = conn.execute(
        "UPDATE schedule_slots SET status = ?5, owner_user_id = ?6, booking_id = ?7
         WHERE court_id = ?1 AND date = ?2 AND start_time = ?3 AND booking_id = ?4",
        params![
            path.court_id,
            path.date,
            path.start_time,
            booking_id,
            slot.status.as_str(),
            slot.owner_user_id,
            slot.booking_id,
        ],
    )?;
    Ok(count)
}

pub fn get_booked_slots(conn: &Connection) -> AppResult<Vec<(SlotPath, ScheduleSlot)>> {
    let mut stmt = conn.prepare(
        "SELECT court_id, date, start_time, status, owner_user_id, booking_id
         FROM schedule_slots WHERE status = 'booked'",
    )?;
    let rows = stmt.query_map([], |row| {
        let path = SlotPath {
            court_id: row.get(0)?,
            date: row.get(1)?,
            start_time: row.get(2)?,
        };
        Ok((path, parse_slot_columns(row, 3)?))
    })?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

fn parse_slot_columns(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<ScheduleSlot> {
    let status: String = row.get(offset)?;
    Ok(ScheduleSlot {
        status: SlotStatus::parse(&status),
        owner_user_id: row.get(offset + 1)?,
        booking_id: row.get(offset + 2)?,
    })
}

// ── Bookings ──

/// `booked_at` is left to the column default so the store stamps it.
pub fn insert_booking(conn: &Connection, booking: &BookingDraft) -> AppResult<usize> {
    let count = conn.execute(
        "INSERT INTO bookings (id, user_id, court_id, court_name, date, start_time, end_time, status, total_price)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            booking.id,
            booking.user_id,
            booking.court_id,
            booking.court_name,
            booking.date,
            booking.start_time,
            booking.end_time,
            booking.status.as_str(),
            booking.total_price,
        ],
    )?;
    Ok(count)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> AppResult<usize> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> AppResult<Option<Booking>> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            parse_booking_row,
        )
        .optional()?;
    Ok(booking)
}

pub fn get_bookings_for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ?1
         ORDER BY date ASC, start_time ASC, id ASC"
    ))?;

    let rows = stmt.query_map(params![user_id], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn get_confirmed_bookings(conn: &Connection) -> AppResult<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = 'Confirmada'
         ORDER BY date ASC, start_time ASC"
    ))?;

    let rows = stmt.query_map([], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

/// Marks confirmed bookings starting before `cutoff` (`YYYY-MM-DD HH:MM`) as completed.
pub fn complete_bookings_before(conn: &Connection, cutoff: &str) -> AppResult<usize> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'Completada'
         WHERE status = 'Confirmada' AND (date || ' ' || start_time) < ?1",
        params![cutoff],
    )?;
    Ok(count)
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let status_str: String = row.get(7)?;
    let status = BookingStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            Type::Text,
            format!("unknown booking status: {status_str}").into(),
        )
    })?;

    let booked_at_str: String = row.get(9)?;
    let booked_at = NaiveDateTime::parse_from_str(&booked_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        court_id: row.get(2)?,
        court_name: row.get(3)?,
        date: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        status,
        total_price: row.get(8)?,
        booked_at,
    })
}
