//! services/api/src/web/state.rs
//!
//! Defines the application's shared state, including the in-memory session
//! table. Sessions are process-scoped by design: nothing about a visitor's
//! login survives a restart, only credentials do.

use crate::config::Config;
use med_imaging_core::ports::{CredentialStore, VisionAnalysisService};
use med_imaging_core::session::Session;
use med_imaging_core::AnalysisOptions;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

/// How long an unused token stays valid. Stale entries are purged lazily on
/// the next insert, so the table stays bounded by active visitors.
const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

//=========================================================================================
// SessionTable (token -> session state machine)
//=========================================================================================

struct SessionEntry {
    session: Session,
    expires_at: Instant,
}

/// In-memory map from the session cookie token to the visitor's session.
pub struct SessionTable {
    entries: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionTable {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Stores a session under a freshly generated token and returns the token.
    /// Entries past their expiry are dropped on the way in.
    pub async fn insert(&self, session: Session) -> String {
        let token = Uuid::new_v4().to_string();
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            token.clone(),
            SessionEntry {
                session,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Looks up the live session for a token, if any.
    pub async fn get(&self, token: &str) -> Option<Session> {
        let entries = self.entries.read().await;
        let entry = entries.get(token)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.session.clone())
    }

    /// Drops the session for a token; the visitor is anonymous afterwards.
    pub async fn remove(&self, token: &str) {
        self.entries.write().await.remove(token);
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub vision: Arc<dyn VisionAnalysisService>,
    pub config: Arc<Config>,
    sessions: SessionTable,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        vision: Arc<dyn VisionAnalysisService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            vision,
            config,
            sessions: SessionTable::default(),
        }
    }

    /// Retry budget for the analysis pipeline, taken from configuration.
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            max_retries: self.config.analysis_max_retries,
            retry_delay: self.config.analysis_retry_delay,
        }
    }

    pub async fn insert_session(&self, session: Session) -> String {
        self.sessions.insert(session).await
    }

    pub async fn get_session(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).await
    }

    pub async fn remove_session(&self, token: &str) {
        self.sessions.remove(token).await
    }
}
