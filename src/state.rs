use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::services::court_feed::CourtsChanged;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub courts_tx: broadcast::Sender<CourtsChanged>,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        let (courts_tx, _) = broadcast::channel(config.court_feed_capacity);
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            courts_tx,
        }
    }

    /// Locks the store. A poisoned lock is recovered: any transaction the
    /// panicking holder had open was rolled back when it was dropped.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wakes every live court subscription; ignored when nobody listens.
    pub fn notify_courts_changed(&self, court_id: &str) {
        let _ = self.courts_tx.send(CourtsChanged {
            court_id: court_id.to_string(),
        });
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> Arc<AppState> {
    let conn = crate::db::init_db(":memory:").expect("in-memory db");
    Arc::new(AppState::new(
        conn,
        AppConfig {
            port: 0,
            database_url: ":memory:".to_string(),
            admin_token: "test-token".to_string(),
            sweep_interval_secs: 0,
            court_feed_capacity: 16,
        },
    ))
}
