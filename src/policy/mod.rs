pub mod config;
pub mod evaluator;
pub mod factory;
pub mod rule;

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::types::request::RequestContext;
use crate::types::state::ResourceState;

/// Well-known response property the decision is written under.
pub const DECISION_PROPERTY: &str = "authzDecision";

/// Well-known request parameter carrying a JSON-encoded query blob that
/// ownership rules inspect.
pub const OWNER_QUERY_PARAM: &str = "q";

/// Trait for policy decision points.
///
/// Implementers map one authorization check to a decision. The trait is
/// thread-safe and can be shared across threads; implementations must not
/// block, since checks run inline on the request processing path.
pub trait Policy: Send + Sync {
    /// Decides a single check and returns the decision.
    fn authorize(&self, check: &AuthzCheck) -> Result<AuthzDecision>;
}

/// Everything a policy needs to decide one request: the request itself
/// (absent when no context could be established upstream) and, for
/// CREATE/UPDATE checks, the target state the request would write.
#[derive(Debug, Clone, Default)]
pub struct AuthzCheck {
    pub request: Option<RequestContext>,
    pub target: Option<ResourceState>,
}

impl AuthzCheck {
    pub fn new(request: RequestContext) -> Self {
        Self {
            request: Some(request),
            target: None,
        }
    }

    /// A check with no request context. Policies fail closed on it.
    pub fn without_context() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: ResourceState) -> Self {
        self.target = Some(target);
        self
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthzDecision {
    /// Access is granted
    Accept,
    /// Access is denied
    Reject,
    /// No applicable policy expressed an opinion. Not a denial by itself;
    /// upstream callers decide what it means.
    Ignore,
}

impl AuthzDecision {
    /// Merges two outcomes under the precedence REJECT > ACCEPT > IGNORE.
    ///
    /// Commutative and associative, so rule order never changes the combined
    /// decision.
    pub fn combine(self, other: AuthzDecision) -> AuthzDecision {
        match (self, other) {
            (AuthzDecision::Reject, _) | (_, AuthzDecision::Reject) => AuthzDecision::Reject,
            (AuthzDecision::Accept, _) | (_, AuthzDecision::Accept) => AuthzDecision::Accept,
            (AuthzDecision::Ignore, AuthzDecision::Ignore) => AuthzDecision::Ignore,
        }
    }
}

impl fmt::Display for AuthzDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthzDecision::Accept => "ACCEPT",
            AuthzDecision::Reject => "REJECT",
            AuthzDecision::Ignore => "IGNORE",
        };
        write!(f, "{s}")
    }
}

/// Builds the response state for a decision, written under
/// [`DECISION_PROPERTY`].
pub fn decision_state(decision: AuthzDecision) -> ResourceState {
    let mut state = ResourceState::new();
    state.put_property(DECISION_PROPERTY, decision.to_string());
    state
}
