use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller role as resolved by the upstream gateway. The subsystem trusts
/// this value; it never verifies credentials itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// The authenticated caller, passed explicitly to every operation that
/// needs it. There is no ambient request context anywhere below the HTTP
/// boundary.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_known_values() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Customer".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!("user".parse::<Role>().unwrap(), Role::Customer);
        assert!("root".parse::<Role>().is_err());
    }
}
