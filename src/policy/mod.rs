//! Route authorization policy shared by the edge and client evaluators.
//! Pure data and pure functions only: no I/O, no clock, no storage.

mod dashboard;
mod decision;
mod role;
mod routes;

pub use dashboard::{Dashboards, Home, DEFAULT_FALLBACK_HOME};
pub use decision::{decide, login_target, Decision, Identity, LOGIN_PATH, ROOT_PATH, UNAUTHORIZED_PATH};
pub use role::{normalize, normalize_opt, Role, LEGACY_ROLE_PREFIX};
pub use routes::{canonical_path, RouteClass, RouteTable, ScopedPrefix};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// The single source of truth for route classification and role homes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub routes: RouteTable,
    pub dashboards: Dashboards,
}

impl Policy {
    pub fn from_json(text: &str) -> AppResult<Self> {
        let p: Policy = serde_json::from_str(text)
            .map_err(|e| AppError::config("policy_parse", e.to_string().as_str()))?;
        Ok(p.normalized())
    }

    pub fn normalized(self) -> Self {
        Self { routes: self.routes.normalized(), dashboards: self.dashboards }
    }

    pub fn classify(&self, path: &str) -> RouteClass<'_> {
        self.routes.classify(path)
    }

    pub fn home_for(&self, role: &Role) -> &str {
        self.dashboards.home_for(role)
    }
}
