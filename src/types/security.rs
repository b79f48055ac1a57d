use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// The established identity of a caller.
///
/// Authentication happens upstream; this type only carries its result.
/// Anonymous callers are represented by a context with empty subject and
/// roles, never by a missing object. A missing request context altogether is
/// a more severe condition handled by the policy engine itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    /// Subject identifier, empty for anonymous callers
    #[serde(default)]
    pub subject: String,

    /// Realm the subject was authenticated in
    #[serde(default)]
    pub realm: String,

    /// Roles granted to the subject
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    pub roles: HashSet<String>,
}

impl SecurityContext {
    /// Creates an identity with no roles.
    pub fn new(realm: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            realm: realm.into(),
            roles: HashSet::new(),
        }
    }

    /// The anonymous identity: empty subject, empty roles.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_roles<I>(mut self, roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.subject.is_empty() && self.roles.is_empty()
    }

    /// Whether the caller holds at least one of the given roles.
    pub fn has_any_role(&self, roles: &HashSet<String>) -> bool {
        !self.roles.is_disjoint(roles)
    }
}
