use super::{Explorer, ExplorerSettings, MediaSource, MediaUrlBuilder};
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "explorer_session";
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

struct Session {
    explorer: Arc<Explorer>,
    last_seen: Instant,
}

/// One [`Explorer`] per viewer, keyed by the session cookie.
pub struct ExplorerSessions {
    source: Arc<dyn MediaSource>,
    urls: MediaUrlBuilder,
    settings: ExplorerSettings,
    max_sessions: usize,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl ExplorerSessions {
    pub fn new(
        source: Arc<dyn MediaSource>,
        urls: MediaUrlBuilder,
        settings: ExplorerSettings,
    ) -> Self {
        Self {
            source,
            urls,
            settings,
            max_sessions: DEFAULT_MAX_SESSIONS,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Returns the caller's explorer, creating a session when the request
    /// carries no known session id. The flag is `true` for new sessions.
    pub async fn resolve(&self, headers: &HeaderMap) -> (Uuid, Arc<Explorer>, bool) {
        let requested = session_id_from_headers(headers);
        let mut sessions = self.sessions.write().await;

        if let Some(id) = requested
            && let Some(session) = sessions.get_mut(&id)
        {
            session.last_seen = Instant::now();
            return (id, session.explorer.clone(), false);
        }

        if sessions.len() >= self.max_sessions
            && let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, session)| session.last_seen)
                .map(|(id, _)| *id)
        {
            debug!(session = %oldest, "Evicting least recently used explorer session");
            sessions.remove(&oldest);
        }

        let id = Uuid::new_v4();
        let explorer = Arc::new(Explorer::new(
            self.source.clone(),
            self.urls.clone(),
            self.settings.clone(),
        ));
        sessions.insert(
            id,
            Session {
                explorer: explorer.clone(),
                last_seen: Instant::now(),
            },
        );
        info!(session = %id, active = sessions.len(), "Created explorer session");

        (id, explorer, true)
    }
}

pub fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    get_cookie_value(headers, SESSION_COOKIE).and_then(|value| Uuid::parse_str(&value).ok())
}

fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
}
