use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{AppError, AppResult};
use crate::handlers::{session_user, today};
use crate::models::{Booking, BookingStatus};
use crate::services::bookings;
use crate::services::orchestrator::{self, CancelBooking, CancelOutcome, CreateBooking};
use crate::state::AppState;

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub court_id: String,
    pub date: String,
    pub start_time: String,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let user_id = session_user(&headers)?;

    let id = orchestrator::create_booking(
        &state,
        &CreateBooking {
            court_id: body.court_id,
            date: body.date,
            start_time: body.start_time,
            user_id,
        },
    )?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub view: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> AppResult<Response> {
    let user_id = session_user(&headers)?;
    let view = query.view.as_deref().unwrap_or("all");
    if !matches!(view, "all" | "upcoming" | "history") {
        return Err(AppError::validation("view", view));
    }

    let all = {
        let db = state.conn();
        bookings::get_by_user(&db, &user_id)?
    };
    let views = bookings::partition(all, today());

    Ok(match view {
        "upcoming" => Json(views.upcoming).into_response(),
        "history" => Json(views.history).into_response(),
        _ => Json(views).into_response(),
    })
}

// GET /api/bookings/upcoming
#[derive(Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<usize>,
}

pub async fn upcoming_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<UpcomingQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let user_id = session_user(&headers)?;
    let limit = query.limit.unwrap_or(1);

    let db = state.conn();
    Ok(Json(bookings::get_upcoming(&db, &user_id, limit, today())?))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let user_id = session_user(&headers)?;
    let booking = {
        let db = state.conn();
        bookings::get_by_id(&db, &id)?
    }
    .ok_or_else(|| AppError::not_found("booking", id.as_str()))?;

    if booking.user_id != user_id {
        return Err(AppError::Authorization {
            booking_id: id,
            user_id,
        });
    }
    Ok(Json(booking))
}

// POST /api/bookings/:id/cancel
#[derive(Deserialize)]
pub struct CancelBookingRequest {
    pub court_id: String,
    pub date: String,
    pub start_time: String,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub id: String,
    pub status: BookingStatus,
    /// False when the booking was already final and nothing was written.
    pub changed: bool,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CancelBookingRequest>,
) -> AppResult<Json<CancelResponse>> {
    let user_id = session_user(&headers)?;

    let outcome = orchestrator::cancel_booking(
        &state,
        &CancelBooking {
            booking_id: id.clone(),
            user_id,
            court_id: body.court_id,
            date: body.date,
            start_time: body.start_time,
        },
    )?;

    let (status, changed) = match outcome {
        CancelOutcome::Cancelled => (BookingStatus::Cancelled, true),
        CancelOutcome::AlreadyFinal(status) => (status, false),
    };
    Ok(Json(CancelResponse {
        id,
        status,
        changed,
    }))
}
