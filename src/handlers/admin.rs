use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::AppResult;
use crate::handlers::check_admin;
use crate::models::NewCourt;
use crate::services::audit::{self, Inconsistency};
use crate::services::schedule;
use crate::state::AppState;

// POST /api/courts
pub async fn add_court(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewCourt>,
) -> AppResult<(StatusCode, Json<Value>)> {
    check_admin(&headers, &state.config.admin_token)?;

    let id = schedule::add_court(&state, body)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

// GET /api/admin/consistency
#[derive(Serialize)]
pub struct ConsistencyReport {
    consistent: bool,
    problems: Vec<Inconsistency>,
}

pub async fn get_consistency(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<ConsistencyReport>> {
    check_admin(&headers, &state.config.admin_token)?;

    let problems = {
        let db = state.conn();
        audit::verify_consistency(&db)?
    };

    Ok(Json(ConsistencyReport {
        consistent: problems.is_empty(),
        problems,
    }))
}
