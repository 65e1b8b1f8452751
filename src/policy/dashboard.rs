use serde::{Deserialize, Serialize};
use tracing::warn;

use super::role::Role;

pub const DEFAULT_FALLBACK_HOME: &str = "/customer/dashboard";

/// Role → landing page map.
///
/// Roles without an entry (TECH in the default table, and any role the
/// normalizer did not recognize) land on `fallback`. Whether that is right for
/// operator-added staff roles is an open question, so the fallback is a named
/// field integrators can override instead of a silent default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dashboards {
    pub homes: Vec<(Role, String)>,
    pub fallback: String,
}

impl Default for Dashboards {
    fn default() -> Self {
        Self {
            homes: vec![
                (Role::Admin, "/admin".into()),
                (Role::Vendor, "/vendor/dashboard".into()),
                (Role::Customer, "/customer/dashboard".into()),
            ],
            fallback: DEFAULT_FALLBACK_HOME.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Home<'a> {
    Mapped(&'a str),
    Fallback(&'a str),
}

impl<'a> Home<'a> {
    pub fn path(&self) -> &'a str {
        match self {
            Home::Mapped(p) | Home::Fallback(p) => *p,
        }
    }
}

impl Dashboards {
    pub fn resolve(&self, role: &Role) -> Home<'_> {
        match self.homes.iter().find(|(r, _)| r == role) {
            Some((_, path)) => Home::Mapped(path.as_str()),
            None => {
                if !role.is_recognized() {
                    warn!(role = %role, fallback = %self.fallback, "unrecognized role routed to fallback dashboard");
                }
                Home::Fallback(self.fallback.as_str())
            }
        }
    }

    pub fn home_for(&self, role: &Role) -> &str {
        self.resolve(role).path()
    }
}
