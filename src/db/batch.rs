//! Atomic multi-path writes.
//!
//! A [`MultiPathWrite`] collects updates to independent paths (court records,
//! schedule slots, bookings) and commits them in one immediate SQLite
//! transaction: either every path changes or none does.

use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{BookingDraft, BookingStatus, NewCourt, ScheduleSlot, SlotPath};

/// Precondition checked against the slot's current value at write time.
#[derive(Debug, Clone)]
pub enum SlotGuard {
    /// Create or overwrite unconditionally.
    None,
    /// Slot must exist and still be `available`; fails the batch otherwise.
    WhileAvailable,
    /// Only overwrite while the slot references this booking. A slot that
    /// moved on is left alone and reported as zero rows touched.
    WhileHeldBy(String),
}

#[derive(Debug, Clone)]
pub enum PathWrite {
    PutCourt { id: String, court: NewCourt },
    PutBooking(BookingDraft),
    SetBookingStatus { booking_id: String, status: BookingStatus },
    PutSlot { path: SlotPath, slot: ScheduleSlot, guard: SlotGuard },
}

impl PathWrite {
    fn apply(&self, conn: &Connection) -> AppResult<usize> {
        match self {
            PathWrite::PutCourt { id, court } => {
                let mut touched = queries::insert_court(conn, id, court)?;
                for (date, schedule) in &court.schedules {
                    for (start_time, slot) in schedule {
                        let path = SlotPath::new(id, date, start_time);
                        touched += queries::upsert_slot(conn, &path, slot)?;
                    }
                }
                Ok(touched)
            }
            PathWrite::PutBooking(draft) => queries::insert_booking(conn, draft),
            PathWrite::SetBookingStatus { booking_id, status } => {
                match queries::update_booking_status(conn, booking_id, *status)? {
                    0 => Err(AppError::not_found("booking", booking_id.as_str())),
                    n => Ok(n),
                }
            }
            PathWrite::PutSlot { path, slot, guard } => match guard {
                SlotGuard::None => queries::upsert_slot(conn, path, slot),
                SlotGuard::WhileAvailable => {
                    let touched = queries::update_slot_if_available(conn, path, slot)?;
                    if touched > 0 {
                        return Ok(touched);
                    }
                    match queries::get_slot(conn, path)? {
                        None => Err(AppError::not_found("slot", path.to_string())),
                        Some(_) => Err(AppError::Conflict { slot: path.clone() }),
                    }
                }
                SlotGuard::WhileHeldBy(booking_id) => {
                    queries::update_slot_if_held_by(conn, path, booking_id, slot)
                }
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct MultiPathWrite {
    writes: Vec<PathWrite>,
}

impl MultiPathWrite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, write: PathWrite) -> Self {
        self.writes.push(write);
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Applies every path in order inside one transaction and returns the
    /// rows touched per path. Any error rolls the whole batch back.
    pub fn commit(self, conn: &mut Connection) -> AppResult<Vec<usize>> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut touched = Vec::with_capacity(self.writes.len());
        for write in &self.writes {
            touched.push(write.apply(&tx)?);
        }

        tx.commit()?;
        Ok(touched)
    }
}
