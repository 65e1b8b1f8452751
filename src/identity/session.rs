use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::policy::{normalize_opt, Identity, Role};
use crate::tprintln;

/// Storage key for the raw bearer token in the client-side mirror.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the serialized user record in the client-side mirror.
pub const USER_KEY: &str = "user";

/// User record cached next to the token after login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// One persisted session: the token plus whatever user record came with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub user: Option<CachedUser>,
}

impl StoredSession {
    pub fn new(token: impl Into<String>, user: Option<CachedUser>) -> Self {
        Self { token: token.into(), user }
    }

    pub fn cached_role(&self) -> Option<Role> {
        normalize_opt(self.user.as_ref().and_then(|u| u.role.as_deref()))
    }

    /// Identity inferred from the cache alone, with no signature or expiry check.
    pub fn unverified_identity(&self) -> Identity {
        Identity::Authenticated { role: self.cached_role() }
    }
}

/// Narrow contract over wherever the current session lives.
///
/// Written by login and logout (external) and by the edge evaluator's
/// expiry cleanup. Writes only ever replace or clear the single current
/// session, so last-write-wins is enough.
pub trait SessionStore: Send + Sync {
    fn read(&self) -> Option<StoredSession>;
    fn write(&self, session: StoredSession);
    fn clear(&self);
}

/// Key/value backed store mirroring the browser layout: the token under
/// [`TOKEN_KEY`] and the JSON user record under [`USER_KEY`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        let s = Self::new();
        s.write(session);
        s
    }

    /// Raw access to a key, as a browser storage inspector would see it.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn set_raw(&self, key: &str, value: impl Into<String>) {
        self.entries.write().insert(key.to_string(), value.into());
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self) -> Option<StoredSession> {
        let map = self.entries.read();
        let token = map.get(TOKEN_KEY).filter(|t| !t.is_empty())?.clone();
        // An unreadable user record degrades to "no role" instead of failing.
        let user = map.get(USER_KEY).and_then(|raw| serde_json::from_str::<CachedUser>(raw).ok());
        Some(StoredSession { token, user })
    }

    fn write(&self, session: StoredSession) {
        let mut map = self.entries.write();
        map.insert(TOKEN_KEY.to_string(), session.token);
        match session.user.and_then(|u| serde_json::to_string(&u).ok()) {
            Some(json) => {
                map.insert(USER_KEY.to_string(), json);
            }
            None => {
                map.remove(USER_KEY);
            }
        }
    }

    fn clear(&self) {
        let mut map = self.entries.write();
        map.remove(TOKEN_KEY);
        map.remove(USER_KEY);
        tprintln!("session.clear keys={},{}", TOKEN_KEY, USER_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> CachedUser {
        CachedUser {
            id: Some(7),
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            role: Some("ROLE_CUSTOMER".into()),
        }
    }

    #[test]
    fn write_read_clear() {
        let store = MemorySessionStore::new();
        assert_eq!(store.read(), None);

        store.write(StoredSession::new("tok", Some(customer())));
        let s = store.read().unwrap();
        assert_eq!(s.token, "tok");
        assert_eq!(s.cached_role(), Some(Role::Customer));
        assert!(store.get_raw(USER_KEY).unwrap().contains("ada@example.com"));

        store.clear();
        assert_eq!(store.read(), None);
        assert_eq!(store.get_raw(USER_KEY), None);
    }

    #[test]
    fn corrupt_user_record_means_no_role() {
        let store = MemorySessionStore::new();
        store.set_raw(TOKEN_KEY, "tok");
        store.set_raw(USER_KEY, "{not json");
        let s = store.read().unwrap();
        assert_eq!(s.user, None);
        assert_eq!(s.unverified_identity(), Identity::Authenticated { role: None });
    }

    #[test]
    fn user_without_token_is_not_a_session() {
        let store = MemorySessionStore::new();
        store.set_raw(USER_KEY, serde_json::to_string(&customer()).unwrap());
        assert_eq!(store.read(), None);
        store.set_raw(TOKEN_KEY, "");
        assert_eq!(store.read(), None);
    }

    #[test]
    fn rewriting_without_user_drops_stale_record() {
        let store = MemorySessionStore::with_session(StoredSession::new("a", Some(customer())));
        store.write(StoredSession::new("b", None));
        assert_eq!(store.read(), Some(StoredSession::new("b", None)));
    }
}
