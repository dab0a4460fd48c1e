use serde::{Deserialize, Serialize};

/// Author of a transcript turn. The string forms double as the wire roles of
/// the model API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_model(self) -> bool {
        self == Role::Model
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            _ => Err(format!("invalid transcript role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// One message of the visible conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }

    /// Empty model turn appended while a reply is on its way.
    pub fn pending() -> Self {
        Self::new(Role::Model, String::new())
    }

    pub fn is_pending(&self) -> bool {
        self.role.is_model() && self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!(Role::try_from("user"), Ok(Role::User));
        assert_eq!(Role::try_from("model"), Ok(Role::Model));
        assert_eq!(String::from(Role::Model), "model");
        assert!(Role::try_from("assistant").is_err());
    }

    #[test]
    fn turn_serializes_role_as_wire_string() {
        let json = serde_json::to_string(&Turn::user("hi")).expect("serialize");
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);

        let err = serde_json::from_str::<Turn>(r#"{"role":"system","content":"x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn pending_turn_is_empty_model_turn() {
        let pending = Turn::pending();
        assert!(pending.is_pending());
        assert!(!Turn::model("done").is_pending());
        assert!(!Turn::user("").is_pending());
    }
}
