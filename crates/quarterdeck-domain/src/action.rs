//! Authorization actions checked by the gate before every operation.

use serde::{Deserialize, Serialize};

/// Closed set of capabilities an actor can be checked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    /// Suffix used when composing audit event names, e.g. `user_create`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_as_snake_case() {
        assert_eq!(serde_json::to_string(&Action::Create).unwrap(), "\"create\"");
        assert_eq!(serde_json::to_string(&Action::Delete).unwrap(), "\"delete\"");
    }

    #[test]
    fn should_expose_audit_suffix() {
        assert_eq!(Action::Update.as_str(), "update");
    }
}
