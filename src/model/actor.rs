use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Closed set of roles the engine branches on. Keeping this a tagged enum
/// (not a string) lets the permission matrices be matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Operator,
    Admin,
    /// Synthetic actor for engine-internal transitions (payment webhook).
    /// Never supplied by the identity gateway.
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Operator => "operator",
            Role::Admin => "admin",
            Role::System => "system",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Operator | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "operator" => Ok(Role::Operator),
            "admin" => Ok(Role::Admin),
            // "system" is deliberately not parseable from request input.
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// The acting user for one request, as supplied by the identity gateway.
/// The engine trusts this pair and does not authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: ObjectId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: ObjectId, role: Role) -> Self {
        Actor { user_id, role }
    }
}
