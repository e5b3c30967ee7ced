pub mod admin;
pub mod bookings;
pub mod courts;
pub mod health;

use axum::http::HeaderMap;
use chrono::{NaiveDate, Utc};

use crate::errors::{AppError, AppResult};
use crate::models::slot_time;

/// Header the auth gateway sets to the signed-in user's id.
pub const USER_HEADER: &str = "x-user-id";

fn session_user(headers: &HeaderMap) -> AppResult<String> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthenticated)
}

fn check_admin(headers: &HeaderMap, expected_token: &str) -> AppResult<()> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthenticated);
    }
    Ok(())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The requested date, or today when the query leaves it out.
fn date_or_today(date: Option<&str>) -> AppResult<String> {
    match date {
        Some(date) => {
            slot_time::parse_date(date)?;
            Ok(date.to_string())
        }
        None => Ok(today().format("%Y-%m-%d").to_string()),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_session_user_requires_header() {
        let mut headers = HeaderMap::new();
        assert!(matches!(session_user(&headers), Err(AppError::Unauthenticated)));

        headers.insert(USER_HEADER, HeaderValue::from_static("  "));
        assert!(matches!(session_user(&headers), Err(AppError::Unauthenticated)));

        headers.insert(USER_HEADER, HeaderValue::from_static("U1"));
        assert_eq!(session_user(&headers).unwrap(), "U1");
    }

    #[test]
    fn test_admin_token_checked() {
        let mut headers = HeaderMap::new();
        assert!(check_admin(&headers, "secret").is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer wrong"));
        assert!(check_admin(&headers, "secret").is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        assert!(check_admin(&headers, "secret").is_ok());
    }

    #[test]
    fn test_date_defaults_to_today() {
        assert_eq!(date_or_today(Some("2024-08-15")).unwrap(), "2024-08-15");
        assert!(date_or_today(Some("15/08/2024")).is_err());
        assert_eq!(date_or_today(None).unwrap().len(), 10);
    }
}
