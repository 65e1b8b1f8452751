//! Route classification table and classifier.
//!
//! Pure string matching over a configured public allow-list and an ordered
//! list of role-scoped prefixes. Every path lands in exactly one class.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::role::Role;

/// One role-scoped prefix with the roles allowed below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedPrefix {
    pub prefix: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl ScopedPrefix {
    /// ADMIN is added if missing; it is a superuser over every scoped area.
    pub fn new(prefix: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut s = Self { prefix: prefix.into(), roles: roles.into_iter().collect() };
        s.ensure_admin();
        s
    }

    fn ensure_admin(&mut self) {
        if !self.roles.contains(&Role::Admin) {
            self.roles.push(Role::Admin);
        }
    }

    pub fn permits(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass<'a> {
    Public,
    RoleScoped(&'a ScopedPrefix),
    DefaultProtected,
}

impl RouteClass<'_> {
    pub fn is_public(&self) -> bool {
        matches!(self, RouteClass::Public)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RouteClass::Public => "public",
            RouteClass::RoleScoped(_) => "role_scoped",
            RouteClass::DefaultProtected => "default_protected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    pub public: Vec<String>,
    /// Login and registration pages. Must also be public.
    pub auth_pages: Vec<String>,
    /// Checked in order; the first matching prefix wins.
    pub scoped: Vec<ScopedPrefix>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public: ["/", "/login", "/register", "/unauthorized", "/map", "/stations", "/about"]
                .into_iter()
                .map(String::from)
                .collect(),
            auth_pages: vec!["/login".into(), "/register".into()],
            scoped: vec![
                ScopedPrefix::new("/admin", [Role::Admin]),
                ScopedPrefix::new("/vendor", [Role::Vendor]),
                ScopedPrefix::new("/customer", [Role::Customer]),
            ],
        }
    }
}

impl RouteTable {
    /// Re-establish table invariants after deserialization.
    pub fn normalized(mut self) -> Self {
        for s in self.scoped.iter_mut() {
            s.ensure_admin();
        }
        for page in self.auth_pages.iter() {
            if !self.public.contains(page) {
                self.public.push(page.clone());
            }
        }
        self
    }

    /// Classifies the canonical form of `path`, so `//admin` and
    /// `/x/../admin` land where `/admin` does.
    pub fn classify(&self, path: &str) -> RouteClass<'_> {
        let path = canonical_path(path);
        let path = path.as_ref();
        if self.public.iter().any(|p| public_match(p, path)) {
            return RouteClass::Public;
        }
        if let Some(s) = self.scoped.iter().find(|s| path.starts_with(s.prefix.as_str())) {
            return RouteClass::RoleScoped(s);
        }
        RouteClass::DefaultProtected
    }

    /// True for the login/registration pages, including their query forms.
    pub fn is_auth_page(&self, path: &str) -> bool {
        let path = canonical_path(path);
        let path = path.as_ref();
        self.auth_pages.iter().any(|p| public_match(p, path))
    }
}

/// Collapse repeated `/` and resolve `.` and `..` segments in the path part;
/// the query string is left untouched. `..` never climbs above the root.
pub fn canonical_path(raw: &str) -> Cow<'_, str> {
    let (path, query) = match raw.find('?') {
        Some(i) => raw.split_at(i),
        None => (raw, ""),
    };
    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut out = String::with_capacity(raw.len());
    out.push('/');
    out.push_str(&segments.join("/"));
    if path.len() > 1 && path.ends_with('/') && !segments.is_empty() {
        out.push('/');
    }
    out.push_str(query);
    if out == raw {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(out)
    }
}

fn public_match(entry: &str, path: &str) -> bool {
    if path == entry {
        return true;
    }
    let Some(rest) = path.strip_prefix(entry) else {
        return false;
    };
    // The root has no children: only `/` itself and `/?query` are public.
    if entry == "/" {
        return rest.starts_with('?');
    }
    rest.starts_with('/') || rest.starts_with('?')
}
