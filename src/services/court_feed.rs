//! Live feed of every court with its schedules.
//!
//! Writers call [`AppState::notify_courts_changed`]; each subscription reloads
//! the full court list and hands it to its callback. Notifications that pile
//! up while a reload runs collapse into a single reload.

use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;

use crate::errors::AppError;
use crate::models::Court;
use crate::services::schedule;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct CourtsChanged {
    pub court_id: String,
}

/// Handle to one running subscription. Dropping it stops the feed.
#[derive(Debug)]
pub struct CourtSubscription {
    handle: Option<JoinHandle<()>>,
}

impl CourtSubscription {
    /// Stops the feed and waits until the task is gone, so no callback runs
    /// after this returns.
    pub async fn unsubscribe(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// False once the feed failed or the notification channel closed.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CourtSubscription {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Starts a feed: `on_change` receives the current court list right away and
/// again after every change. A store failure is reported once through
/// `on_error` and ends the feed; callers subscribe again to recover.
///
/// Must be called from within a tokio runtime.
pub fn subscribe_courts<F, E>(state: Arc<AppState>, mut on_change: F, on_error: E) -> CourtSubscription
where
    F: FnMut(Vec<Court>) + Send + 'static,
    E: FnOnce(AppError) + Send + 'static,
{
    // Subscribe before the first read so no change between the two is lost.
    let mut rx = state.courts_tx.subscribe();

    let handle = tokio::spawn(async move {
        loop {
            let courts = {
                let conn = state.conn();
                schedule::list_courts(&conn)
            };
            match courts {
                Ok(courts) => {
                    tracing::debug!(courts = courts.len(), "court feed snapshot");
                    on_change(courts);
                }
                Err(e) => {
                    tracing::error!(error = %e, "court feed failed");
                    on_error(e);
                    return;
                }
            }

            match rx.recv().await {
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "court feed lagged; reloading");
                }
                Err(RecvError::Closed) => return,
            }
            loop {
                match rx.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        }
    });

    CourtSubscription {
        handle: Some(handle),
    }
}
