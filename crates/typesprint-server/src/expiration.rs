use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::AppState;

/// Start the background task that purges expired sessions
pub fn start_expiration_cleaner(state: Arc<AppState>) -> JoinHandle<()> {
    let interval = Duration::from_secs(state.config.cleanup_interval_seconds);

    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(interval);

        loop {
            interval_timer.tick().await;
            run_cleanup(&state);
        }
    })
}

pub fn run_cleanup(state: &AppState) {
    match state.store.purge_expired_sessions(Utc::now()) {
        Ok(count) if count > 0 => debug!(sessions_cleaned = count, "Expired sessions cleaned"),
        Err(e) => error!(error = %e, "Failed to clean up expired sessions"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_session;
    use crate::store::SessionRecord;
    use crate::testutil::{insert_user, test_state};

    #[test]
    fn test_run_cleanup_removes_only_expired_sessions() {
        let state = test_state();
        let user = insert_user(&state, "ada", "secret123");
        let live = issue_session(&state, &user.id).unwrap();

        let past = Utc::now() - chrono::Duration::hours(2);
        state
            .store
            .put_session(SessionRecord {
                token: "stale".to_string(),
                user_id: user.id.clone(),
                created_at: past,
                expires_at: past + chrono::Duration::hours(1),
            })
            .unwrap();

        run_cleanup(&state);

        assert!(state.store.get_session(&live.token).unwrap().is_some());
        assert!(state.store.get_session("stale").unwrap().is_none());
    }
}
