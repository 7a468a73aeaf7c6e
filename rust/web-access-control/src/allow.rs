use serde::Serialize;

use crate::AccessMode;

/// The outcome of an access decision. A denial is an ordinary value: it is
/// cached and returned like any allowance, never treated as a failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessVerdict {
    /// The request must not proceed
    Denied,
    /// The request may proceed
    Allowed {
        /// True iff the verdict was reached without any agent identity,
        /// i.e. the allowance applies to the public
        public: bool,
    },
}

impl AccessVerdict {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessVerdict::Allowed { .. })
    }

    /// Whether the request may proceed for the public specifically.
    pub fn is_public(&self) -> bool {
        matches!(self, AccessVerdict::Allowed { public: true })
    }
}

/// The modes permitted on a resource, per actor: the public always, and
/// the configured agent when one was named. Used to populate a `WAC-Allow`
/// advertisement header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AllowSummary {
    /// Modes permitted to any party
    pub public: Vec<AccessMode>,
    /// Modes permitted to the configured agent
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub agent: Option<Vec<AccessMode>>,
}

impl AllowSummary {
    /// Render this summary as a `WAC-Allow` header value: comma-joined
    /// `name="space-separated lowercase modes"` entries, one per non-empty
    /// actor, the agent (`user`) entry first.
    ///
    /// ```
    /// use web_access_control::{AccessMode, AllowSummary};
    ///
    /// let summary = AllowSummary {
    ///     public: vec![AccessMode::Read],
    ///     agent: Some(vec![AccessMode::Read, AccessMode::Write]),
    /// };
    /// assert_eq!(summary.header_value(), r#"user="read write", public="read""#);
    /// ```
    pub fn header_value(&self) -> String {
        let mut entries: Vec<(&str, &[AccessMode])> = Vec::new();

        if let Some(agent) = &self.agent {
            entries.push(("user", agent));
        }
        entries.push(("public", &self.public));

        entries
            .into_iter()
            .filter(|(_, modes)| !modes.is_empty())
            .map(|(actor, modes)| {
                let modes = modes
                    .iter()
                    .map(|mode| mode.name().to_ascii_lowercase())
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(r#"{actor}="{modes}""#)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_renders_an_entry_per_non_empty_actor() {
        let summary = AllowSummary {
            public: vec![AccessMode::Read],
            agent: Some(vec![AccessMode::Read, AccessMode::Write]),
        };
        assert_eq!(summary.header_value(), r#"user="read write", public="read""#);
    }

    #[test]
    fn it_omits_empty_mode_sets_entirely() {
        let summary = AllowSummary {
            public: Vec::new(),
            agent: Some(vec![AccessMode::Control]),
        };
        assert_eq!(summary.header_value(), r#"user="control""#);

        let summary = AllowSummary {
            public: vec![AccessMode::Read],
            agent: Some(Vec::new()),
        };
        assert_eq!(summary.header_value(), r#"public="read""#);

        assert_eq!(AllowSummary::default().header_value(), "");
    }

    #[test]
    fn it_distinguishes_public_allowances() {
        assert!(AccessVerdict::Allowed { public: true }.is_public());
        assert!(!AccessVerdict::Allowed { public: false }.is_public());
        assert!(AccessVerdict::Allowed { public: false }.is_allowed());
        assert!(!AccessVerdict::Denied.is_allowed());
    }

    #[test]
    fn it_serializes_the_agent_entry_as_user() {
        let summary = AllowSummary {
            public: vec![AccessMode::Read],
            agent: Some(vec![AccessMode::Write]),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "public": ["Read"], "user": ["Write"] })
        );
    }
}
