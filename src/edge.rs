//!
//! Edge evaluator
//! --------------
//! Request-time route guard. This is the only place a protected page is
//! actually withheld: it validates the credential (signature and expiry)
//! before deciding, and clears a dead credential as part of the redirect so
//! the next request does not replay it.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, warn};

use crate::identity::{CredentialDecoder, RequestCredentials, SessionStore};
use crate::policy::{decide, Decision, Identity, Policy};

/// A decision reached by validating the credential.
///
/// Only this module can construct one, so nothing downstream can pass a
/// client-side hint off as an access-control verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoritativeDecision(Decision);

impl AuthoritativeDecision {
    pub fn decision(&self) -> &Decision {
        &self.0
    }

    pub fn into_decision(self) -> Decision {
        self.0
    }

    pub fn is_allow(&self) -> bool {
        self.0 == Decision::Allow
    }
}

#[derive(Debug, Clone)]
pub struct EdgeEvaluator {
    policy: Arc<Policy>,
    decoder: CredentialDecoder,
}

impl EdgeEvaluator {
    pub fn new(policy: Arc<Policy>, decoder: CredentialDecoder) -> Self {
        Self { policy, decoder }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Resolve the visitor's identity, clearing the store when the credential
    /// is unusable.
    pub fn identify_at(&self, store: &dyn SessionStore, now: i64) -> Identity {
        let Some(session) = store.read() else {
            return Identity::Anonymous;
        };
        match self.decoder.decode_at(&session.token, now) {
            Ok(claims) => claims.identity(),
            Err(e) => {
                warn!(error = %e, code = e.code(), "rejecting credential");
                store.clear();
                Identity::Anonymous
            }
        }
    }

    pub fn evaluate_at(&self, path: &str, store: &dyn SessionStore, now: i64) -> AuthoritativeDecision {
        let identity = self.identify_at(store, now);
        let decision = decide(&self.policy, &identity, path);
        debug!(
            path = path,
            class = self.policy.classify(path).label(),
            role = identity.role().map(|r| r.as_str()).unwrap_or("-"),
            decision = decision.label(),
            "edge decision"
        );
        AuthoritativeDecision(decision)
    }

    pub fn evaluate(&self, path: &str, store: &dyn SessionStore) -> AuthoritativeDecision {
        self.evaluate_at(path, store, chrono::Utc::now().timestamp())
    }
}

/// Shared state for [`edge_guard`].
#[derive(Debug, Clone)]
pub struct GuardState {
    pub evaluator: Arc<EdgeEvaluator>,
    pub cookie_name: Arc<str>,
}

/// axum middleware running the edge evaluator in front of every guarded route.
pub async fn edge_guard(State(state): State<GuardState>, request: Request, next: Next) -> Response {
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let creds = RequestCredentials::from_headers(request.headers(), &state.cookie_name);
    let verdict = state.evaluator.evaluate(&path, &creds);

    let mut response = match verdict.decision().location() {
        None => next.run(request).await,
        Some(location) => Redirect::temporary(&location).into_response(),
    };
    if let Some(cookie) = creds.set_cookie_header() {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::test_tokens::{mint, mint_with, SECRET};
    use crate::identity::{MemorySessionStore, StoredSession};
    use crate::policy::Role;

    const NOW: i64 = 1_760_000_000;

    fn evaluator() -> EdgeEvaluator {
        EdgeEvaluator::new(Arc::new(Policy::default()), CredentialDecoder::from_secret(SECRET))
    }

    fn store_with(token: String) -> MemorySessionStore {
        MemorySessionStore::with_session(StoredSession::new(token, None))
    }

    #[test]
    fn scenario_customer_on_login_goes_home() {
        let store = store_with(mint(Some("CUSTOMER"), NOW + 600));
        let d = evaluator().evaluate_at("/login", &store, NOW).into_decision();
        assert_eq!(d, Decision::RedirectRoleHome { role: Role::Customer, home: "/customer/dashboard".into() });
    }

    #[test]
    fn scenario_anonymous_admin_reports() {
        let store = MemorySessionStore::new();
        let d = evaluator().evaluate_at("/admin/reports", &store, NOW);
        assert_eq!(d.decision().location().as_deref(), Some("/login?redirect=/admin/reports"));
    }

    #[test]
    fn scenario_vendor_on_customer_area() {
        let store = store_with(mint(Some("VENDOR"), NOW + 600));
        let d = evaluator().evaluate_at("/customer/history", &store, NOW);
        assert_eq!(d.decision(), &Decision::RedirectUnauthorized);
    }

    #[test]
    fn scenario_admin_on_vendor_dashboard() {
        let store = store_with(mint(Some("ADMIN"), NOW + 600));
        assert!(evaluator().evaluate_at("/vendor/dashboard", &store, NOW).is_allow());
    }

    #[test]
    fn scenario_expired_credential_is_cleared() {
        let store = store_with(mint(Some("CUSTOMER"), NOW - 1));
        let d = evaluator().evaluate_at("/customer/dashboard", &store, NOW);
        assert_eq!(d.decision(), &Decision::RedirectLogin { original: "/customer/dashboard".into() });
        assert_eq!(store.read(), None);
    }

    #[test]
    fn forged_credential_on_public_page_is_cleared_but_allowed() {
        let store = store_with(mint_with(b"forged", Some("ADMIN"), NOW + 600));
        let d = evaluator().evaluate_at("/map", &store, NOW);
        assert!(d.is_allow());
        assert_eq!(store.read(), None);
    }

    #[test]
    fn expiry_at_exactly_now_is_accepted() {
        let store = store_with(mint(Some("VENDOR"), NOW));
        assert!(evaluator().evaluate_at("/vendor/dashboard", &store, NOW).is_allow());
        assert!(store.read().is_some());
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let e = evaluator();
        let store = store_with(mint(Some("TECH"), NOW + 600));
        let first = e.evaluate_at("/admin", &store, NOW);
        assert_eq!(first.decision(), &Decision::RedirectUnauthorized);
        assert_eq!(e.evaluate_at("/admin", &store, NOW), first);
    }
}
