//! Per-client state kept on the server.
//!
//! A session is the whole UI state of one logged-in client: who they are,
//! which screen they are on and how far the current scan has gone.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::analysis::workflow::Workflow;
use crate::model::User;
use crate::navigation::Navigator;

const TOKEN_LENGTH: usize = 32;

/// State owned by one client.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub navigator: Navigator,
    pub workflow: Workflow,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self {
            navigator: Navigator::new(user.role),
            workflow: Workflow::default(),
            user,
        }
    }
}

/// Shared handle, inserted into request extensions by the auth middleware.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Handle plus the token it was resolved from.
#[derive(Clone)]
pub struct CurrentSession {
    pub token: String,
    pub handle: SessionHandle,
}

/// Token to session map.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl SessionStore {
    /// Open a session for `user` and return its token.
    pub fn open(&self, user: User) -> String {
        let token = generate_token();
        let user_id = user.id;

        self.sessions
            .write()
            .insert(token.clone(), Arc::new(Mutex::new(Session::new(user))));
        tracing::debug!(user_id, "session opened");

        token
    }

    pub fn get(&self, token: &str) -> Option<SessionHandle> {
        self.sessions.read().get(token).cloned()
    }

    /// Drop one session. Returns whether it existed.
    pub fn close(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    /// Drop every session of `user_id`.
    pub fn revoke_user(&self, user_id: u64) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.lock().user.id != user_id);

        let revoked = before - sessions.len();
        if revoked > 0 {
            tracing::info!(user_id, revoked, "sessions revoked");
        }
        revoked
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::View;

    #[test]
    fn test_tokens_are_unique_hex() {
        let store = SessionStore::default();
        let users = crate::fixtures::users();

        let first = store.open(users[0].clone());
        let second = store.open(users[0].clone());

        assert_ne!(first, second);
        assert_eq!(first.len(), TOKEN_LENGTH * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_session_starts_on_landing_view() {
        let store = SessionStore::default();
        let users = crate::fixtures::users();

        let token = store.open(users[4].clone());
        let session = store.get(&token).unwrap();
        let session = session.lock();
        assert_eq!(session.navigator.active(), View::History);
        assert_eq!(session.workflow, Workflow::Idle);
    }

    #[test]
    fn test_close_and_revoke() {
        let store = SessionStore::default();
        let users = crate::fixtures::users();

        let director = store.open(users[0].clone());
        let laura = store.open(users[2].clone());
        store.open(users[2].clone());

        assert!(store.close(&director));
        assert!(!store.close(&director));
        assert!(store.get(&director).is_none());

        assert_eq!(store.revoke_user(3), 2);
        assert!(store.get(&laura).is_none());
        assert!(store.is_empty());
    }
}
