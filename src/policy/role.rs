use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Legacy marker some identity providers put in front of role names.
pub const LEGACY_ROLE_PREFIX: &str = "ROLE_";

/// Canonical role of an authenticated visitor.
///
/// The known variants cover the marketplace's three role classes (TECH is a
/// staff variant next to VENDOR). Anything else survives normalization as
/// `Other` so dashboard lookup can route it through the explicit fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Vendor,
    Customer,
    Tech,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::Vendor => "VENDOR",
            Role::Customer => "CUSTOMER",
            Role::Tech => "TECH",
            Role::Other(s) => s.as_str(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Role::Other(_))
    }
}

/// Normalize a raw role string: trim, upper-case, strip every leading
/// `ROLE_` marker. Stripping repeats so `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> Role {
    let mut up = raw.trim().to_uppercase();
    while let Some(rest) = up.strip_prefix(LEGACY_ROLE_PREFIX) {
        up = rest.to_string();
    }
    match up.as_str() {
        "ADMIN" => Role::Admin,
        "VENDOR" => Role::Vendor,
        "CUSTOMER" => Role::Customer,
        "TECH" => Role::Tech,
        _ => Role::Other(up),
    }
}

/// Optional-role helper for claims and cached user records. Blank strings
/// count as absent.
pub fn normalize_opt(raw: Option<&str>) -> Option<Role> {
    raw.filter(|s| !s.trim().is_empty()).map(normalize)
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(normalize(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_prefix_and_case_are_ignored() {
        assert_eq!(normalize("role_admin"), Role::Admin);
        assert_eq!(normalize("ADMIN"), Role::Admin);
        assert_eq!(normalize("Role_Vendor"), Role::Vendor);
        assert_eq!(normalize("  customer "), Role::Customer);
        assert_eq!(normalize("tech"), Role::Tech);
    }

    #[test]
    fn unknown_roles_pass_through_uppercased() {
        assert_eq!(normalize("supervisor"), Role::Other("SUPERVISOR".into()));
        assert_eq!(normalize("ROLE_"), Role::Other(String::new()));
        assert!(!normalize("supervisor").is_recognized());
    }

    #[test]
    fn normalize_is_idempotent() {
        let corpus = [
            "admin", "ROLE_ADMIN", "role_role_vendor", "Customer", "tech", "ROLE_", "",
            "  role_x ", "ROLE_ROLE_ROLE_", "ünïcode", "role_Supervisor",
        ];
        for raw in corpus {
            let once = normalize(raw);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn blank_optional_role_is_absent() {
        assert_eq!(normalize_opt(None), None);
        assert_eq!(normalize_opt(Some("   ")), None);
        assert_eq!(normalize_opt(Some("role_customer")), Some(Role::Customer));
    }

    #[test]
    fn serde_normalizes_on_the_way_in() {
        let r: Role = serde_json::from_str("\"role_tech\"").unwrap();
        assert_eq!(r, Role::Tech);
        assert_eq!(serde_json::to_string(&Role::Vendor).unwrap(), "\"VENDOR\"");
    }
}
