use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::policy::{normalize_opt, Identity, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential could not be decoded: {0}")]
    Malformed(String),

    #[error("credential signature is invalid")]
    InvalidSignature,

    #[error("credential expired at {exp} (now {now})")]
    Expired { exp: i64, now: i64 },
}

impl CredentialError {
    pub fn code(&self) -> &'static str {
        match self {
            CredentialError::Malformed(_) => "credential_malformed",
            CredentialError::InvalidSignature => "credential_signature",
            CredentialError::Expired { .. } => "credential_expired",
        }
    }
}

/// Decoded token body. Only `exp` is mandatory; issuance is external so the
/// remaining claims are read leniently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
}

impl Claims {
    pub fn role(&self) -> Option<Role> {
        normalize_opt(self.role.as_deref())
    }

    pub fn identity(&self) -> Identity {
        Identity::Authenticated { role: self.role() }
    }
}

/// Validates HS256 bearer tokens.
///
/// Expiry is checked here rather than by `jsonwebtoken` so the boundary is
/// exact (`exp == now` is still valid) and the clock can be injected.
#[derive(Clone)]
pub struct CredentialDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl CredentialDecoder {
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();
        Self { key: DecodingKey::from_secret(secret), validation }
    }

    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, CredentialError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => CredentialError::InvalidSignature,
                _ => CredentialError::Malformed(e.to_string()),
            }
        })?;
        let claims = data.claims;
        if claims.exp < now {
            return Err(CredentialError::Expired { exp: claims.exp, now });
        }
        Ok(claims)
    }

    pub fn decode_now(&self, token: &str) -> Result<Claims, CredentialError> {
        self.decode_at(token, chrono::Utc::now().timestamp())
    }
}

impl fmt::Debug for CredentialDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialDecoder([REDACTED])")
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use super::Claims;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub const SECRET: &[u8] = b"test-secret-for-guard";

    pub fn mint(role: Option<&str>, exp: i64) -> String {
        mint_with(SECRET, role, exp)
    }

    pub fn mint_with(secret: &[u8], role: Option<&str>, exp: i64) -> String {
        let claims = Claims {
            sub: Some("driver@example.com".into()),
            id: Some(42),
            name: Some("Test Driver".into()),
            role: role.map(String::from),
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).expect("encode test token")
    }
}

#[cfg(test)]
mod tests {
    use super::test_tokens::{mint, mint_with, SECRET};
    use super::*;

    const NOW: i64 = 1_760_000_000;

    #[test]
    fn valid_token_decodes() {
        let d = CredentialDecoder::from_secret(SECRET);
        let claims = d.decode_at(&mint(Some("role_vendor"), NOW + 60), NOW).unwrap();
        assert_eq!(claims.id, Some(42));
        assert_eq!(claims.role(), Some(Role::Vendor));
    }

    #[test]
    fn expiry_boundary_is_exact() {
        let d = CredentialDecoder::from_secret(SECRET);
        assert_eq!(
            d.decode_at(&mint(Some("admin"), NOW - 1), NOW),
            Err(CredentialError::Expired { exp: NOW - 1, now: NOW })
        );
        assert!(d.decode_at(&mint(Some("admin"), NOW), NOW).is_ok());
        assert!(d.decode_at(&mint(Some("admin"), NOW + 1), NOW).is_ok());
    }

    #[test]
    fn wrong_secret_is_a_signature_error() {
        let d = CredentialDecoder::from_secret(SECRET);
        let t = mint_with(b"someone-else", Some("admin"), NOW + 60);
        assert_eq!(d.decode_at(&t, NOW), Err(CredentialError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let d = CredentialDecoder::from_secret(SECRET);
        for t in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert!(matches!(d.decode_at(t, NOW), Err(CredentialError::Malformed(_))), "{t:?}");
        }
    }

    #[test]
    fn missing_role_claim_yields_roleless_identity() {
        let d = CredentialDecoder::from_secret(SECRET);
        let claims = d.decode_at(&mint(None, NOW + 5), NOW).unwrap();
        assert_eq!(claims.identity(), Identity::Authenticated { role: None });
    }
}
