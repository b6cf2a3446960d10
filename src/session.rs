//! Per-user session state
//!
//! Ephemeral settings and the last produced artifact for each user. The
//! store is injected into whatever needs it; there is no ambient global
//! state, which keeps components testable in isolation.

use crate::models::{ImageSize, Style};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Generation settings carried across requests within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub size: ImageSize,
    pub style: Style,
}

/// The most recent image produced for a user, kept so it can be reused
/// (background removal, regeneration). Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub image_bytes: Vec<u8>,
    pub artifact_id: Uuid,
    pub source_prompt: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserSession {
    pub settings: Settings,
    pub awaiting_prompt: bool,
    pub last_artifact: Option<Artifact>,
}

/// Process-wide map of user id to session, created lazily on first access.
/// Per-user operations are serialized by the presentation layer; cross-user
/// operations share nothing beyond this map.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<u64, UserSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the user's session, creating defaults on first access.
    pub fn get_or_create(&self, user_id: u64) -> UserSession {
        self.sessions
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .clone()
    }

    pub fn set_awaiting_prompt(&self, user_id: u64, awaiting: bool) {
        self.with_session(user_id, |session| session.awaiting_prompt = awaiting);
    }

    pub fn set_size(&self, user_id: u64, size: ImageSize) {
        self.with_session(user_id, |session| session.settings.size = size);
    }

    pub fn set_style(&self, user_id: u64, style: Style) {
        self.with_session(user_id, |session| session.settings.style = style);
    }

    /// Replace the user's last artifact with a freshly identified one.
    pub fn record_artifact(&self, user_id: u64, image_bytes: Vec<u8>, source_prompt: &str) -> Uuid {
        let artifact_id = Uuid::new_v4();
        self.with_session(user_id, |session| {
            session.last_artifact = Some(Artifact {
                image_bytes,
                artifact_id,
                source_prompt: source_prompt.to_string(),
            });
        });
        artifact_id
    }

    pub fn last_artifact(&self, user_id: u64) -> Option<Artifact> {
        self.sessions
            .lock()
            .unwrap()
            .get(&user_id)
            .and_then(|session| session.last_artifact.clone())
    }

    fn with_session<F: FnOnce(&mut UserSession)>(&self, user_id: u64, mutate: F) {
        let mut sessions = self.sessions.lock().unwrap();
        mutate(sessions.entry(user_id).or_default());
    }
}
