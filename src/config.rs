//! Environment-driven configuration.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `EVGATE_HTTP_PORT` | HTTP listen port | `3000` |
//! | `EVGATE_JWT_SECRET` | HS256 secret used to validate credentials | required |
//! | `EVGATE_COOKIE_NAME` | name of the auth cookie | `token` |
//! | `EVGATE_POLICY_FILE` | JSON policy overriding the built-in route table | built-in |
//! | `EVGATE_API_BASE` | backend origin, passed through to collaborators | unset |

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::policy::Policy;

pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_COOKIE_NAME: &str = "token";

#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub http_port: u16,
    pub jwt_secret: String,
    pub cookie_name: String,
    pub policy_file: Option<PathBuf>,
    pub api_base: Option<String>,
}

impl GuardConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup so tests need not touch the process env.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_port = match lookup("EVGATE_HTTP_PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|_| {
                AppError::config("bad_port".to_string(), format!("EVGATE_HTTP_PORT is not a port: {v}"))
            })?,
            None => DEFAULT_HTTP_PORT,
        };
        let jwt_secret = lookup("EVGATE_JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::config("missing_secret", "EVGATE_JWT_SECRET must be set"))?;
        let cookie_name = lookup("EVGATE_COOKIE_NAME")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());
        Ok(Self {
            http_port,
            jwt_secret,
            cookie_name,
            policy_file: lookup("EVGATE_POLICY_FILE").filter(|s| !s.is_empty()).map(PathBuf::from),
            api_base: lookup("EVGATE_API_BASE").filter(|s| !s.is_empty()),
        })
    }

    pub fn load_policy(&self) -> AppResult<Policy> {
        match &self.policy_file {
            Some(path) => load_policy_file(path),
            None => Ok(Policy::default()),
        }
    }
}

pub fn load_policy_file(path: &Path) -> AppResult<Policy> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::io("policy_read".to_string(), format!("{}: {}", path.display(), e)))?;
    let policy = Policy::from_json(&text)?;
    info!(
        path = %path.display(),
        public = policy.routes.public.len(),
        scoped = policy.routes.scoped.len(),
        "loaded route policy"
    );
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply() {
        let c = GuardConfig::from_lookup(lookup(&[("EVGATE_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(c.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(c.cookie_name, "token");
        assert_eq!(c.policy_file, None);
        assert_eq!(c.load_policy().unwrap(), Policy::default());
    }

    #[test]
    fn secret_is_required() {
        let err = GuardConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.code_str(), "missing_secret");
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = GuardConfig::from_lookup(lookup(&[("EVGATE_JWT_SECRET", "x"), ("EVGATE_HTTP_PORT", "http")]))
            .unwrap_err();
        assert_eq!(err.code_str(), "bad_port");
    }

    #[test]
    fn policy_file_is_loaded_and_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(
            &path,
            r#"{"routes": {"public": ["/"], "auth_pages": ["/login"], "scoped": [{"prefix": "/ops", "roles": ["tech"]}]}}"#,
        )
        .unwrap();
        let c = GuardConfig::from_lookup(lookup(&[
            ("EVGATE_JWT_SECRET", "x"),
            ("EVGATE_POLICY_FILE", path.to_str().unwrap()),
        ]))
        .unwrap();
        let p = c.load_policy().unwrap();
        assert_eq!(p.routes.scoped[0].roles, vec![Role::Tech, Role::Admin]);
        assert!(p.classify("/login").is_public());
    }

    #[test]
    fn missing_policy_file_is_io_error() {
        let err = load_policy_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.code_str(), "policy_read");
        assert_eq!(err.http_status(), 503);
    }
}
