//! Client evaluator.
//!
//! Runs after a page mounts and on every path change, using only the locally
//! cached session. It exists to avoid a flash of the wrong page; it performs
//! no signature or expiry check and must never be used to withhold data.
//! Its output is a [`NavigationHint`], deliberately a different type from
//! [`crate::edge::AuthoritativeDecision`].

use std::sync::Arc;

use tracing::debug;

use crate::identity::SessionStore;
use crate::policy::{canonical_path, decide, Decision, Identity, Policy, RouteClass, LOGIN_PATH, ROOT_PATH};

/// Advisory navigation correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationHint {
    Stay,
    /// Navigate, keeping the current entry in history.
    Push(String),
    /// Navigate, replacing the current history entry.
    Replace(String),
}

impl NavigationHint {
    pub fn target(&self) -> Option<&str> {
        match self {
            NavigationHint::Stay => None,
            NavigationHint::Push(p) | NavigationHint::Replace(p) => Some(p.as_str()),
        }
    }
}

/// Executes navigation hints in whatever page context hosts the evaluator.
pub trait Navigator {
    fn push(&mut self, path: &str);
    fn replace(&mut self, path: &str);
}

pub struct ClientEvaluator<S: SessionStore> {
    policy: Arc<Policy>,
    store: S,
}

impl<S: SessionStore> ClientEvaluator<S> {
    pub fn new(policy: Arc<Policy>, store: S) -> Self {
        Self { policy, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Compute the correction for `path` without performing it.
    pub fn hint(&self, path: &str) -> NavigationHint {
        let identity = match self.store.read() {
            Some(session) => session.unverified_identity(),
            None => Identity::Anonymous,
        };
        let hint = self.hint_for(&identity, path);
        // Already where we would send them: nothing to do.
        let hint = match hint.target() {
            Some(target) if target == path => NavigationHint::Stay,
            _ => hint,
        };
        debug!(path = path, hint = ?hint, "client navigation hint");
        hint
    }

    fn hint_for(&self, identity: &Identity, path: &str) -> NavigationHint {
        let class = self.policy.classify(path);
        let home = |identity: &Identity| {
            identity
                .role()
                .map(|r| NavigationHint::Push(self.policy.home_for(r).to_string()))
                .unwrap_or(NavigationHint::Stay)
        };

        if identity.is_authenticated() && canonical_path(path) == ROOT_PATH {
            return home(identity);
        }
        match decide(&self.policy, identity, path) {
            Decision::RedirectRoleHome { home, .. } => NavigationHint::Push(home),
            // Default-protected pages are left to the edge evaluator.
            Decision::RedirectLogin { .. } => match class {
                RouteClass::RoleScoped(_) => NavigationHint::Replace(LOGIN_PATH.to_string()),
                _ => NavigationHint::Stay,
            },
            Decision::RedirectUnauthorized => home(identity),
            Decision::Allow => NavigationHint::Stay,
        }
    }

    /// Evaluate `path` and carry out the resulting hint.
    pub fn on_path_change(&self, path: &str, navigator: &mut dyn Navigator) -> NavigationHint {
        let hint = self.hint(path);
        match &hint {
            NavigationHint::Stay => {}
            NavigationHint::Push(p) => navigator.push(p),
            NavigationHint::Replace(p) => navigator.replace(p),
        }
        hint
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
