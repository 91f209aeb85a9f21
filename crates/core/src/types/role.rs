//! User roles.

use serde::{Deserialize, Serialize};

/// Role attached to a user account.
///
/// Customers create and track orders; drivers accept, deliver, and report
/// their position. Stored as the `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Driver,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Driver => write!(f, "driver"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "driver" => Ok(Self::Driver),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles() {
        assert_eq!("customer".parse::<Role>(), Ok(Role::Customer));
        assert_eq!("driver".parse::<Role>(), Ok(Role::Driver));
        assert!("admin".parse::<Role>().is_err());
    }
}
