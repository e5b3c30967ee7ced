use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::models::SlotPath;

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the repositories, the orchestrator and the HTTP layer.
///
/// The `Display` text is for logs only. Callers render messages from
/// [`AppError::kind`] and [`AppError::context`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("store transaction failed: {0}")]
    Transaction(#[from] rusqlite::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("user {user_id} does not own booking {booking_id}")]
    Authorization { booking_id: String, user_id: String },

    #[error("invalid {field}: {value:?}")]
    Validation { field: &'static str, value: String },

    #[error("slot {slot} is not available")]
    Conflict { slot: SlotPath },

    #[error("unauthenticated")]
    Unauthenticated,
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(field: &'static str, value: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            value: value.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Transaction(_) => "transaction",
            AppError::NotFound { .. } => "not_found",
            AppError::Authorization { .. } => "authorization",
            AppError::Validation { .. } => "validation",
            AppError::Conflict { .. } => "conflict",
            AppError::Unauthenticated => "unauthenticated",
        }
    }

    pub fn context(&self) -> serde_json::Value {
        match self {
            AppError::Transaction(_) | AppError::Unauthenticated => json!({}),
            AppError::NotFound { entity, id } => json!({ "entity": entity, "id": id }),
            AppError::Authorization {
                booking_id,
                user_id,
            } => json!({ "booking_id": booking_id, "user_id": user_id }),
            AppError::Validation { field, value } => json!({ "field": field, "value": value }),
            AppError::Conflict { slot } => json!({
                "court_id": slot.court_id,
                "date": slot.date,
                "start_time": slot.start_time,
                "path": slot.to_string(),
            }),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Authorization { .. } => StatusCode::FORBIDDEN,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = json!({ "kind": self.kind(), "context": self.context() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_has_no_message_text() {
        let err = AppError::Conflict {
            slot: SlotPath::new("c1", "2024-08-15", "09:00"),
        };
        assert_eq!(err.kind(), "conflict");
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let ctx = err.context();
        assert_eq!(ctx["path"], "courts/c1/schedules/2024-08-15/09:00");
        assert_eq!(ctx["start_time"], "09:00");
    }

    #[test]
    fn test_store_errors_map_to_transaction_kind() {
        let err: AppError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.kind(), "transaction");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.context(), json!({}));
    }
}
