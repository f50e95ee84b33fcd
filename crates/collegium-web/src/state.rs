use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use collegium_core::{CollegeRepository, CredentialStore, FileStore};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::ServerConfig;

/// Unique identifier for a browser session
pub type SessionId = Uuid;

/// One-shot message shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Error => "flash-error",
        }
    }
}

/// Session tracks whether a browser has logged in
pub struct Session {
    pub id: SessionId,
    pub username: String,
    pub authenticated: bool,
    pub flash: Option<Flash>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, username: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            authenticated: true,
            flash: None,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}

/// How long a logged-out session is kept so its flash message can be shown
const LOGGED_OUT_TTL: TimeDelta = TimeDelta::minutes(10);

/// Server-side session table keyed by the session cookie
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an authenticated session under a fresh id
    pub fn login(&mut self, username: String) -> SessionId {
        self.prune_logged_out(Utc::now() - LOGGED_OUT_TTL);
        let id = Uuid::new_v4();
        self.sessions.insert(id, Session::new(id, username));
        id
    }

    /// Clear the authenticated flag; returns whether the session was logged in.
    /// The session itself stays so a flash message can reach the login page.
    pub fn logout(&mut self, id: SessionId) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) if session.authenticated => {
                session.authenticated = false;
                session.touch();
                true
            }
            _ => false,
        }
    }

    /// Drop logged-out sessions last seen before `cutoff`; returns how many went.
    pub fn prune_logged_out(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.authenticated || session.last_seen >= cutoff);
        let pruned = before - self.sessions.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned logged-out sessions");
        }
        pruned
    }

    /// Forget a session entirely, e.g. the anonymous one replaced at login
    pub fn remove(&mut self, id: SessionId) {
        self.sessions.remove(&id);
    }

    /// Username of an authenticated session, refreshing its last-seen time
    pub fn authenticated_user(&mut self, id: SessionId) -> Option<String> {
        let session = self.sessions.get_mut(&id).filter(|s| s.authenticated)?;
        session.touch();
        Some(session.username.clone())
    }

    pub fn set_flash(&mut self, id: SessionId, kind: FlashKind, text: impl Into<String>) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.flash = Some(Flash {
                kind,
                text: text.into(),
            });
        }
    }

    pub fn take_flash(&mut self, id: SessionId) -> Option<Flash> {
        self.sessions.get_mut(&id)?.flash.take()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub colleges: Arc<CollegeRepository>,
    pub files: Arc<FileStore>,
    pub credentials: Arc<CredentialStore>,
    pub sessions: Arc<RwLock<SessionStore>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Open (and create if missing) the stores under `config.data_dir`
    pub async fn open(config: ServerConfig) -> anyhow::Result<Self> {
        let colleges = CollegeRepository::open(config.colleges_path()).await?;
        let credentials = CredentialStore::open(config.users_path()).await?;
        let files = FileStore::open(config.files_dir()).await?;

        tracing::info!(data_dir = %config.data_dir.display(), "Opened data stores");

        Ok(Self {
            colleges: Arc::new(colleges),
            files: Arc::new(files),
            credentials: Arc::new(credentials),
            sessions: Arc::new(RwLock::new(SessionStore::new())),
            config: Arc::new(config),
        })
    }

    pub async fn flash(&self, session: SessionId, kind: FlashKind, text: impl Into<String>) {
        self.sessions.write().await.set_flash(session, kind, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut store = SessionStore::new();
        let id = store.login("admin".to_string());
        assert_eq!(store.authenticated_user(id).as_deref(), Some("admin"));

        store.set_flash(id, FlashKind::Success, "saved");
        assert_eq!(store.take_flash(id).map(|f| f.text).as_deref(), Some("saved"));
        assert!(store.take_flash(id).is_none());

        assert!(store.logout(id));
        assert!(!store.logout(id));
        assert!(store.authenticated_user(id).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_login_prunes_stale_logged_out_sessions() {
        let mut store = SessionStore::new();
        let stale = store.login("admin".to_string());
        let recent = store.login("admin".to_string());
        let active = store.login("admin".to_string());
        store.logout(stale);
        store.logout(recent);

        let long_ago = Utc::now() - TimeDelta::hours(1);
        if let Some(session) = store.sessions.get_mut(&stale) {
            session.last_seen = long_ago;
        }
        if let Some(session) = store.sessions.get_mut(&active) {
            session.last_seen = long_ago;
        }

        let fresh = store.login("admin".to_string());
        assert!(!store.sessions.contains_key(&stale));
        assert!(store.sessions.contains_key(&recent));
        assert_eq!(store.authenticated_user(active).as_deref(), Some("admin"));
        assert_eq!(store.authenticated_user(fresh).as_deref(), Some("admin"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_unknown_session_is_anonymous() {
        let mut store = SessionStore::new();
        assert!(store.is_empty());
        assert!(store.authenticated_user(Uuid::new_v4()).is_none());
    }
}
