use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// Lifetime of a session when none is configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Identity attached to a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user_id: String,
    pub username: String,
}

struct SessionEntry {
    info: SessionInfo,
    expires_at: DateTime<Utc>,
}

/// In-memory bearer-token table shared by every request handler.
///
/// Expiry is checked when a token is validated; an expired entry is removed
/// at that point and reported exactly like an unknown token.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    ttl: TimeDelta,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: Mutex::new(HashMap::new()),
                ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            }),
        }
    }

    /// Record a new session and return its token: a random v4 UUID.
    pub fn issue(&self, user_id: &str, username: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now()
            .checked_add_signed(self.inner.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.lock().insert(
            token.clone(),
            SessionEntry {
                info: SessionInfo {
                    user_id: user_id.to_string(),
                    username: username.to_string(),
                },
                expires_at,
            },
        );

        info!(user_id, "Session issued");
        token
    }

    /// Forget a token. Unknown tokens are ignored.
    pub fn revoke(&self, token: &str) {
        if let Some(entry) = self.lock().remove(token) {
            info!(user_id = %entry.info.user_id, "Session revoked");
        }
    }

    pub fn validate(&self, token: &str) -> Result<SessionInfo, ApiError> {
        let mut sessions = self.lock();

        let Some(entry) = sessions.get(token) else {
            return Err(ApiError::Unauthenticated("Unauthorized"));
        };

        if entry.expires_at <= Utc::now() {
            sessions.remove(token);
            debug!("Expired session dropped");
            return Err(ApiError::Unauthenticated("Unauthorized"));
        }

        Ok(entry.info.clone())
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        before - sessions.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.lock().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn expires_at(&self, token: &str) -> Option<DateTime<Utc>> {
        self.lock().get(token).map(|entry| entry.expires_at)
    }

    // The map holds no cross-entry invariants, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

/// Background task that bounds memory by pruning expired sessions.
/// Validation does not depend on it.
pub async fn run_sweep_loop(store: SessionStore, interval: Duration) {
    if interval.is_zero() {
        warn!("Session sweep interval is zero; sweep disabled");
        return;
    }

    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        let count = store.purge_expired();
        if count > 0 {
            info!("Session sweep: pruned {} expired sessions", count);
        }
    }
}
