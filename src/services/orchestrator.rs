//! Booking lifecycle: the only place where a slot and its booking change.
//!
//! Both operations write the booking and the slot in one [`MultiPathWrite`],
//! so a failure leaves both records exactly as they were.

use serde::Deserialize;

use crate::db::batch::{MultiPathWrite, SlotGuard};
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{slot_time, BookingDraft, BookingStatus, ScheduleSlot, SlotPath};
use crate::services::{bookings, schedule};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub court_id: String,
    pub date: String,
    pub start_time: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelBooking {
    pub booking_id: String,
    pub user_id: String,
    pub court_id: String,
    pub date: String,
    pub start_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// The booking was already cancelled or completed; nothing was written.
    AlreadyFinal(BookingStatus),
}

fn require(field: &'static str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(field, value));
    }
    Ok(())
}

/// Books an open slot for `user_id` and returns the new booking id.
///
/// The court's current name and rate are copied onto the booking; later
/// changes to the court do not touch existing bookings.
///
/// The slot is claimed with a conditional write: if it stopped being
/// `available` after the caller looked at it, the whole write is dropped and
/// the caller gets [`AppError::Conflict`].
pub fn create_booking(state: &AppState, req: &CreateBooking) -> AppResult<String> {
    require("court_id", &req.court_id)?;
    require("user_id", &req.user_id)?;
    slot_time::parse_date(&req.date)?;
    let end_time = slot_time::end_time(&req.start_time)?;

    let booking_id = bookings::create_id();
    let path = SlotPath::new(&req.court_id, &req.date, &req.start_time);

    let committed = {
        let mut conn = state.conn();
        let (court_name, hourly_rate) = queries::get_court_pricing(&conn, &req.court_id)?
            .ok_or_else(|| AppError::not_found("court", req.court_id.as_str()))?;
        let draft = BookingDraft {
            id: booking_id.clone(),
            user_id: req.user_id.clone(),
            court_id: req.court_id.clone(),
            court_name,
            date: req.date.clone(),
            start_time: req.start_time.clone(),
            end_time,
            status: BookingStatus::Confirmed,
            total_price: hourly_rate.map(|rate| rate * f64::from(slot_time::SLOT_HOURS)),
        };

        MultiPathWrite::new()
            .with(bookings::write_booking(draft))
            .with(schedule::write_slot(
                path.clone(),
                ScheduleSlot::booked(&req.user_id, &booking_id),
                SlotGuard::WhileAvailable,
            ))
            .commit(&mut conn)
    };

    if let Err(e) = committed {
        tracing::warn!(slot = %path, user_id = %req.user_id, kind = e.kind(), "booking not created");
        return Err(e);
    }

    tracing::info!(booking_id = %booking_id, slot = %path, user_id = %req.user_id, "booking created");
    state.notify_courts_changed(&req.court_id);
    Ok(booking_id)
}

/// Cancels a confirmed booking and frees its slot.
///
/// Ownership is checked against the stored booking, not the caller's claim.
/// Cancelling a booking that is already cancelled or completed succeeds
/// without writing anything.
pub fn cancel_booking(state: &AppState, req: &CancelBooking) -> AppResult<CancelOutcome> {
    require("booking_id", &req.booking_id)?;
    require("user_id", &req.user_id)?;
    slot_time::parse_date(&req.date)?;
    slot_time::parse_start_time(&req.start_time)?;
    let path = SlotPath::new(&req.court_id, &req.date, &req.start_time);

    let touched = {
        let mut conn = state.conn();
        let booking = bookings::get_by_id(&conn, &req.booking_id)?
            .ok_or_else(|| AppError::not_found("booking", req.booking_id.as_str()))?;

        if booking.user_id != req.user_id {
            tracing::warn!(booking_id = %req.booking_id, user_id = %req.user_id, "cancel refused: not the owner");
            return Err(AppError::Authorization {
                booking_id: req.booking_id.clone(),
                user_id: req.user_id.clone(),
            });
        }

        if booking.status.is_final() {
            tracing::info!(booking_id = %req.booking_id, status = booking.status.as_str(), "booking already final; nothing to cancel");
            return Ok(CancelOutcome::AlreadyFinal(booking.status));
        }

        if booking.court_id != path.court_id
            || booking.date != path.date
            || booking.start_time != path.start_time
        {
            return Err(AppError::validation("slot", path.to_string()));
        }

        MultiPathWrite::new()
            .with(bookings::update_status(&booking.id, BookingStatus::Cancelled))
            .with(schedule::write_slot(
                path.clone(),
                ScheduleSlot::available(),
                SlotGuard::WhileHeldBy(booking.id.clone()),
            ))
            .commit(&mut conn)?
    };

    if touched.get(1).copied().unwrap_or(0) == 0 {
        tracing::warn!(booking_id = %req.booking_id, slot = %path, "slot no longer referenced the booking; left as is");
    }

    tracing::info!(booking_id = %req.booking_id, slot = %path, "booking cancelled");
    state.notify_courts_changed(&req.court_id);
    Ok(CancelOutcome::Cancelled)
}
