//! Browser sessions: the `docsync_session` cookie and a TTL-bounded store
//! of in-flight credentials.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};
use docsync_core::{SessionContext, SessionId, SessionStore, SyncError};
use moka::future::Cache;
use tracing::debug;

pub const SESSION_COOKIE: &str = "docsync_session";

/// Session store evicting contexts that stay idle longer than the TTL.
pub struct MokaSessionStore {
    cache: Cache<SessionId, SessionContext>,
}

impl MokaSessionStore {
    pub fn new(time_to_idle: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_idle(time_to_idle)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl SessionStore for MokaSessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionContext>, SyncError> {
        Ok(self.cache.get(id).await)
    }

    async fn save(&self, context: SessionContext) -> Result<(), SyncError> {
        self.cache.insert(context.id, context).await;
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<(), SyncError> {
        self.cache.invalidate(id).await;
        debug!("Session {} removed", id);
        Ok(())
    }
}

/// Session id from the request's `Cookie` headers, if present and well-formed.
pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// `Set-Cookie` value binding the browser to `session`.
pub fn session_cookie(session: &SessionId) -> HeaderValue {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session
    );
    // A UUID and fixed ASCII are always a valid header value.
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}
