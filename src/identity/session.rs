//! Session store collaborator contract and the memory-backed reference
//! implementation. A session maps an opaque token to a principal identifier
//! and nothing else; the full record is resolved on every request.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::RwLock;
use tracing::debug;

use crate::util::random_token;

pub type SessionToken = String;

#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: String,
    expires_at: Instant,
}

/// Keyed session storage with TTL expiry. `resolve` returns the principal
/// identifier the token was issued for, or `None` once the token is unknown
/// or expired.
pub trait SessionStore: Send + Sync {
    fn issue(&self, user_id: &str) -> Result<SessionToken>;
    fn resolve(&self, token: &str) -> Result<Option<String>>;
    fn destroy(&self, token: &str) -> Result<bool>;
}

pub struct MemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, sessions: RwLock::new(HashMap::new()) }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }
}

impl SessionStore for MemorySessionStore {
    fn issue(&self, user_id: &str) -> Result<SessionToken> {
        let token = random_token();
        let entry =
            SessionEntry { user_id: user_id.to_string(), expires_at: Instant::now() + self.ttl };
        self.sessions.write().insert(token.clone(), entry);
        debug!("session.issue user={} ttl_secs={}", user_id, self.ttl.as_secs());
        Ok(token)
    }

    fn resolve(&self, token: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut drop_key: Option<String> = None;
        let out = {
            let map = self.sessions.read();
            match map.get(token) {
                Some(ent) if ent.expires_at > now => Some(ent.user_id.clone()),
                Some(_) => {
                    drop_key = Some(token.to_string());
                    None
                }
                None => None,
            }
        };
        if let Some(k) = drop_key {
            self.sessions.write().remove(&k);
        }
        Ok(out)
    }

    fn destroy(&self, token: &str) -> Result<bool> {
        Ok(self.sessions.write().remove(token).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_resolve_returns_user_id() {
        let store = MemorySessionStore::default();
        let token = store.issue("u1").unwrap();
        assert_eq!(store.resolve(&token).unwrap().as_deref(), Some("u1"));
    }

    #[test]
    fn expired_sessions_do_not_resolve() {
        let store = MemorySessionStore::new(Duration::ZERO);
        let token = store.issue("u1").unwrap();
        assert_eq!(store.resolve(&token).unwrap(), None);
        // the expired entry is pruned, not just hidden
        assert!(!store.destroy(&token).unwrap());
    }

    #[test]
    fn destroy_removes_and_reports() {
        let store = MemorySessionStore::default();
        let token = store.issue("u1").unwrap();
        assert!(store.destroy(&token).unwrap());
        assert!(!store.destroy(&token).unwrap());
        assert_eq!(store.resolve(&token).unwrap(), None);
    }

    #[test]
    fn unknown_token_resolves_to_none() {
        let store = MemorySessionStore::default();
        assert_eq!(store.resolve("no-such-token").unwrap(), None);
    }
}
