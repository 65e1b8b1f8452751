use axum::http::{header, HeaderMap, HeaderValue};
use parking_lot::Mutex;

use super::session::{SessionStore, StoredSession};

/// Where an inbound credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Cookie,
    Bearer,
}

/// Request-scoped view of the credential store.
///
/// Reads the auth cookie (preferred) or an `Authorization: Bearer` header.
/// `clear` and `write` are recorded and turned into `Set-Cookie` headers by
/// the caller once the response is built.
#[derive(Debug)]
pub struct RequestCredentials {
    cookie_name: String,
    found: Option<(CredentialSource, String)>,
    pending: Mutex<Pending>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
enum Pending {
    #[default]
    Untouched,
    Cleared,
    /// Only reached through `SessionStore::write`. The guard itself never
    /// issues credentials; an upstream login handler sharing this store does.
    Replaced(String),
}

impl RequestCredentials {
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        let found = parse_cookie(headers, cookie_name)
            .filter(|v| !v.is_empty())
            .map(|v| (CredentialSource::Cookie, v))
            .or_else(|| bearer_token(headers).map(|t| (CredentialSource::Bearer, t)));
        Self { cookie_name: cookie_name.to_string(), found, pending: Mutex::new(Pending::Untouched) }
    }

    pub fn source(&self) -> Option<CredentialSource> {
        self.found.as_ref().map(|(s, _)| *s)
    }

    pub fn was_cleared(&self) -> bool {
        *self.pending.lock() == Pending::Cleared
    }

    /// `Set-Cookie` value to attach to the response, if the store was mutated.
    pub fn set_cookie_header(&self) -> Option<HeaderValue> {
        match &*self.pending.lock() {
            Pending::Untouched => None,
            Pending::Cleared => clear_cookie(&self.cookie_name),
            Pending::Replaced(token) => set_cookie(&self.cookie_name, token),
        }
    }
}

impl SessionStore for RequestCredentials {
    fn read(&self) -> Option<StoredSession> {
        match &*self.pending.lock() {
            Pending::Cleared => return None,
            Pending::Replaced(token) => return Some(StoredSession::new(token.clone(), None)),
            Pending::Untouched => {}
        }
        self.found.as_ref().map(|(_, token)| StoredSession::new(token.clone(), None))
    }

    fn write(&self, session: StoredSession) {
        *self.pending.lock() = Pending::Replaced(session.token);
    }

    fn clear(&self) {
        *self.pending.lock() = Pending::Cleared;
    }
}

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all(header::COOKIE).iter() {
        let Ok(s) = cookie.to_str() else { continue };
        for part in s.split(';') {
            let p = part.trim();
            if let Some((k, v)) = p.split_once('=') {
                if k == name {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

pub fn set_cookie(name: &str, value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{}={}; HttpOnly; Secure; SameSite=Lax; Path=/", name, value)).ok()
}

pub fn clear_cookie(name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; HttpOnly; Secure; SameSite=Lax; Path=/",
        name
    ))
    .ok()
}
