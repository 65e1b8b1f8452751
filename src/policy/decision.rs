//! Shared decision function.
//!
//! Both evaluators funnel through [`decide`]; they only differ in how they
//! build the [`Identity`] and how they act on the resulting [`Decision`].

use serde::Serialize;

use super::role::Role;
use super::routes::{canonical_path, RouteClass};
use super::Policy;

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const ROOT_PATH: &str = "/";

/// What the evaluator knows about the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    /// A credential the evaluator accepted. `role` is `None` when the
    /// credential carried no usable role claim.
    Authenticated { role: Option<Role> },
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }

    pub fn role(&self) -> Option<&Role> {
        match self {
            Identity::Authenticated { role } => role.as_ref(),
            Identity::Anonymous => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    RedirectLogin { original: String },
    RedirectUnauthorized,
    RedirectRoleHome { role: Role, home: String },
}

impl Decision {
    /// Redirect location, `None` for `Allow`.
    pub fn location(&self) -> Option<String> {
        match self {
            Decision::Allow => None,
            Decision::RedirectLogin { original } => Some(login_target(original)),
            Decision::RedirectUnauthorized => Some(UNAUTHORIZED_PATH.to_string()),
            Decision::RedirectRoleHome { home, .. } => Some(home.clone()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::RedirectLogin { .. } => "redirect_login",
            Decision::RedirectUnauthorized => "redirect_unauthorized",
            Decision::RedirectRoleHome { .. } => "redirect_role_home",
        }
    }
}

/// `/login?redirect=<path>`. Each segment is percent-encoded; separators stay
/// readable so `/admin/reports` round-trips as-is.
pub fn login_target(original: &str) -> String {
    let encoded = original
        .split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{LOGIN_PATH}?redirect={encoded}")
}

/// Authoritative rule set:
/// 1. anonymous on a non-public route → login, preserving the path;
/// 2. authenticated with a role on an auth page → role home;
/// 3. role-scoped route: no role → login, role not permitted → unauthorized;
/// 4. anything else → allow.
///
/// The path is canonicalized first; the login redirect carries the canonical
/// form, never a `//host` path.
pub fn decide(policy: &Policy, identity: &Identity, path: &str) -> Decision {
    let path = canonical_path(path);
    let path = path.as_ref();
    let class = policy.routes.classify(path);
    match (identity, class) {
        (Identity::Anonymous, RouteClass::Public) => Decision::Allow,
        (Identity::Anonymous, _) => Decision::RedirectLogin { original: path.to_string() },
        (Identity::Authenticated { role }, RouteClass::Public) => match role {
            Some(role) if policy.routes.is_auth_page(path) => Decision::RedirectRoleHome {
                role: role.clone(),
                home: policy.dashboards.home_for(role).to_string(),
            },
            _ => Decision::Allow,
        },
        (Identity::Authenticated { role }, RouteClass::RoleScoped(scope)) => match role {
            None => Decision::RedirectLogin { original: path.to_string() },
            Some(role) if scope.permits(role) => Decision::Allow,
            Some(_) => Decision::RedirectUnauthorized,
        },
        (Identity::Authenticated { .. }, RouteClass::DefaultProtected) => Decision::Allow,
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod decision_tests;
