use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::handlers::{date_or_today, session_user};
use crate::models::availability::with_availability;
use crate::models::{slot_time, Court, CourtAvailability};
use crate::services::court_feed::subscribe_courts;
use crate::services::schedule;
use crate::state::AppState;

// GET /api/courts
#[derive(Deserialize)]
pub struct CourtsQuery {
    pub date: Option<String>,
    pub q: Option<String>,
}

pub async fn list_courts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CourtsQuery>,
) -> AppResult<Json<Vec<CourtAvailability>>> {
    session_user(&headers)?;
    let date = date_or_today(query.date.as_deref())?;

    let courts = {
        let db = state.conn();
        match query.q.as_deref() {
            Some(q) => schedule::find_courts_by_name(&db, q)?,
            None => schedule::list_courts(&db)?,
        }
    };

    Ok(Json(with_availability(courts, &date)))
}

// GET /api/courts/:court_id
pub async fn get_court(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(court_id): Path<String>,
) -> AppResult<Json<Court>> {
    session_user(&headers)?;
    let db = state.conn();
    Ok(Json(schedule::get_court(&db, &court_id)?))
}

// GET /api/courts/:court_id/schedule/:date
#[derive(Deserialize)]
pub struct ScheduleQuery {
    #[serde(default)]
    pub available: bool,
}

pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((court_id, date)): Path<(String, String)>,
    Query(query): Query<ScheduleQuery>,
) -> AppResult<Json<Value>> {
    session_user(&headers)?;
    let db = state.conn();

    if query.available {
        let slots = schedule::list_available_slots(&db, &court_id, &date)?;
        return Ok(Json(json!({
            "court_id": court_id,
            "date": date,
            "available": slots,
        })));
    }

    slot_time::parse_date(&date)?;
    if !queries::court_exists(&db, &court_id)? {
        return Err(AppError::not_found("court", court_id));
    }
    let slots = schedule::get_daily_schedule(&db, &court_id, &date)?;

    // `slots` is null when nothing is scheduled for the date yet.
    Ok(Json(json!({
        "court_id": court_id,
        "date": date,
        "slots": slots,
    })))
}

// GET /api/courts/stream
#[derive(Deserialize)]
pub struct StreamQuery {
    pub date: Option<String>,
}

pub async fn courts_stream(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<StreamQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    session_user(&headers)?;
    let date = date_or_today(query.date.as_deref())?;

    let (tx, rx) = mpsc::unbounded_channel();
    let err_tx = tx.clone();

    let subscription = subscribe_courts(
        state,
        move |courts| {
            let data = serde_json::to_string(&with_availability(courts, &date)).unwrap_or_default();
            let _ = tx.send(Event::default().event("courts").data(data));
        },
        move |e: AppError| {
            let data = json!({ "kind": e.kind(), "context": e.context() }).to_string();
            let _ = err_tx.send(Event::default().event("error").data(data));
        },
    );

    // The subscription lives inside the stream and stops when the client goes away.
    let stream = UnboundedReceiverStream::new(rx).map(move |event| {
        let _feed = &subscription;
        Ok(event)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
