use std::{env, time::Duration};

use rocket::{
    Build, Rocket,
    fairing::{self, Fairing, Info, Kind},
};
use tokio::time;
use tracing::{debug, info, warn};

use crate::logic::Sessions;

fn env_secs(name: &str, default: u64) -> u64 {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}

pub async fn start_cleanup_task(sessions: Sessions) {
    let cleanup_interval_secs = env_secs("CLEANUP_INTERVAL_SECONDS", 60);
    let inactive_timeout_secs = env_secs("INACTIVE_SESSION_TIMEOUT_SECONDS", 600);
    let active_timeout_secs = env_secs("ACTIVE_SESSION_TIMEOUT_SECONDS", 86400);

    let mut interval = time::interval(Duration::from_secs(cleanup_interval_secs.max(1)));

    info!(
        "Started board cleanup task: every {}s, inactive timeout {}s, active timeout {}s",
        cleanup_interval_secs, inactive_timeout_secs, active_timeout_secs
    );

    loop {
        interval.tick().await;
        cleanup_sessions(
            &sessions,
            Duration::from_secs(inactive_timeout_secs),
            Duration::from_secs(active_timeout_secs),
        );
    }
}

pub fn cleanup_sessions(sessions: &Sessions, inactive: Duration, active: Duration) -> usize {
    let mut expired = Vec::new();

    for entry in sessions.iter() {
        // A locked session is busy handling input, so it is not idle.
        if let Ok(board) = entry.value().try_lock()
            && board.should_cleanup(inactive, active)
        {
            expired.push(entry.key().clone());
        }
    }

    let removed_count = expired.len();
    for id in expired {
        sessions.remove(&id);
        debug!("Cleaned up board: {}", id);
    }

    if removed_count > 0 {
        info!("Cleaned up {} expired boards", removed_count);
    }
    removed_count
}

pub struct CleanupFairing;

#[rocket::async_trait]
impl Fairing for CleanupFairing {
    fn info(&self) -> Info {
        Info {
            name: "Board Cleanup Task",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        if let Some(sessions) = rocket.state::<Sessions>() {
            info!("Starting cleanup task for board sessions");
            let sessions = sessions.clone();
            tokio::spawn(start_cleanup_task(sessions));
        } else {
            warn!("Failed to get session state for cleanup task");
        }
        Ok(rocket)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dashmap::DashMap;
    use dtekv_common::models::CreateRequest;
    use dtekv_minesweeper::GameConfig;
    use tokio::sync::Mutex;

    use super::*;
    use crate::logic::BoardSession;

    fn sessions_with(ids: &[&str]) -> Sessions {
        let sessions: Sessions = Arc::new(DashMap::new());
        for id in ids {
            let board = BoardSession::new(CreateRequest::default(), GameConfig::default()).unwrap();
            sessions.insert(id.to_string(), Arc::new(Mutex::new(board)));
        }
        sessions
    }

    #[test]
    fn removes_idle_sessions() {
        let sessions = sessions_with(&["a", "b"]);
        let hour = Duration::from_secs(3600);
        assert_eq!(cleanup_sessions(&sessions, hour, hour), 0);
        assert_eq!(cleanup_sessions(&sessions, Duration::ZERO, hour), 2);
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn skips_sessions_in_use() {
        let sessions = sessions_with(&["busy", "idle"]);
        let busy = sessions.get("busy").unwrap().value().clone();
        let _guard = busy.lock().await;

        assert_eq!(cleanup_sessions(&sessions, Duration::ZERO, Duration::ZERO), 1);
        assert!(sessions.contains_key("busy"));
        assert!(!sessions.contains_key("idle"));
    }
}
