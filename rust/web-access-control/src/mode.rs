use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The vocabulary namespace that qualifies mode names when they are handed
/// to the decision oracle.
pub const ACL_NAMESPACE: &str = "http://www.w3.org/ns/auth/acl#";

/// A named access capability being checked or granted.
///
/// The four standard modes are first-class variants; anything else is an
/// extension mode carried verbatim in [`AccessMode::Other`]. Mode names are
/// compared case-insensitively when validated against an allow-list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Permission to read the resource
    Read,
    /// Permission to overwrite or delete the resource
    Write,
    /// Permission to add to the resource without rewriting existing content
    Append,
    /// Permission to read and write the resource's access control document
    Control,
    /// An extension mode outside the standard vocabulary
    Other(String),
}

impl AccessMode {
    /// The four standard modes, in their advertised order.
    pub fn standard() -> [AccessMode; 4] {
        [
            AccessMode::Read,
            AccessMode::Write,
            AccessMode::Append,
            AccessMode::Control,
        ]
    }

    /// The capitalized name of this mode.
    pub fn name(&self) -> &str {
        match self {
            AccessMode::Read => "Read",
            AccessMode::Write => "Write",
            AccessMode::Append => "Append",
            AccessMode::Control => "Control",
            AccessMode::Other(name) => name,
        }
    }

    /// The namespace-qualified identifier of this mode, as supplied to the
    /// decision oracle.
    pub fn uri(&self) -> String {
        format!("{ACL_NAMESPACE}{}", self.name())
    }

    /// Case-insensitive comparison by mode name.
    pub fn matches(&self, other: &AccessMode) -> bool {
        self.name().eq_ignore_ascii_case(other.name())
    }

    /// The mode implied by an HTTP request method, if the method maps onto
    /// one. Safe methods check `Read`, mutating methods check `Write`, and
    /// unknown methods yield `None` so callers can answer 405 themselves.
    pub fn for_http_method(method: &str) -> Option<AccessMode> {
        match method.to_ascii_uppercase().as_str() {
            "GET" | "HEAD" | "OPTIONS" => Some(AccessMode::Read),
            "PUT" | "POST" | "DELETE" | "COPY" => Some(AccessMode::Write),
            _ => None,
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for AccessMode {
    fn from(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "read" => AccessMode::Read,
            "write" => AccessMode::Write,
            "append" => AccessMode::Append,
            "control" => AccessMode::Control,
            _ => AccessMode::Other(name.to_owned()),
        }
    }
}

impl Serialize for AccessMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for AccessMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(AccessMode::from(name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_qualifies_modes_against_the_acl_namespace() {
        assert_eq!(
            AccessMode::Read.uri(),
            "http://www.w3.org/ns/auth/acl#Read"
        );
        assert_eq!(
            AccessMode::Other("Subscribe".into()).uri(),
            "http://www.w3.org/ns/auth/acl#Subscribe"
        );
    }

    #[test]
    fn it_matches_mode_names_case_insensitively() {
        assert!(AccessMode::Read.matches(&AccessMode::from("READ")));
        assert!(AccessMode::from("control").matches(&AccessMode::Control));
        assert!(!AccessMode::Read.matches(&AccessMode::Write));
    }

    #[test]
    fn it_maps_http_methods_onto_modes() {
        assert_eq!(AccessMode::for_http_method("get"), Some(AccessMode::Read));
        assert_eq!(AccessMode::for_http_method("HEAD"), Some(AccessMode::Read));
        assert_eq!(AccessMode::for_http_method("PUT"), Some(AccessMode::Write));
        assert_eq!(
            AccessMode::for_http_method("DELETE"),
            Some(AccessMode::Write)
        );
        assert_eq!(AccessMode::for_http_method("PATCH"), None);
    }

    #[test]
    fn it_serializes_modes_as_plain_strings() {
        let modes = vec![AccessMode::Read, AccessMode::Other("Subscribe".into())];
        let json = serde_json::to_string(&modes).unwrap();
        assert_eq!(json, r#"["Read","Subscribe"]"#);

        let parsed: Vec<AccessMode> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, modes);
    }
}
