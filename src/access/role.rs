use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller role, recomputed per request. Variant order is the permission
/// order: `Guest < User < Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    User,
    Owner,
}

impl Role {
    /// True when a caller holding `self` may act where `required` is needed.
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Owner => "owner",
        };
        f.write_str(name)
    }
}
